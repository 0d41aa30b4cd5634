use serde::{Deserialize, Serialize};

/// Advisory health of the link to a remote endpoint. Display state only;
/// never gates dispatch or execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkHealth {
    #[default]
    Unreachable,
    Degraded,
    Healthy,
}

impl LinkHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unreachable => "unreachable",
            Self::Degraded => "degraded",
            Self::Healthy => "healthy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unreachable" => Some(Self::Unreachable),
            "degraded" => Some(Self::Degraded),
            "healthy" => Some(Self::Healthy),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        assert_eq!(LinkHealth::parse("degraded"), Some(LinkHealth::Degraded));
        assert_eq!(LinkHealth::Healthy.as_str(), "healthy");
        assert_eq!(LinkHealth::default(), LinkHealth::Unreachable);
    }
}
