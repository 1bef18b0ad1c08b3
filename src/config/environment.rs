//! Deployment environment classification.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Deployment environment the service runs in.
///
/// Controls logging defaults (level and format); nothing else in the
/// bootstrap branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production deployment.
    Production,
    /// Staging deployment.
    Staging,
    /// Test environment (CI, integration suites).
    Testing,
    /// Local development.
    #[default]
    Development,
}

impl Environment {
    /// Returns the lowercase name of the environment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Testing => "testing",
            Self::Development => "development",
        }
    }

    /// Returns `true` for the production environment.
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    /// Returns `true` for the staging environment.
    #[must_use]
    pub fn is_staging(self) -> bool {
        self == Self::Staging
    }

    /// Returns `true` for the testing environment.
    #[must_use]
    pub fn is_testing(self) -> bool {
        self == Self::Testing
    }

    /// Returns `true` for the development environment.
    #[must_use]
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "testing" => Ok(Self::Testing),
            "development" => Ok(Self::Development),
            other => Err(crate::Error::config(format!(
                "unknown environment '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("production", Environment::Production)]
    #[test_case("staging", Environment::Staging)]
    #[test_case("testing", Environment::Testing)]
    #[test_case("development", Environment::Development)]
    #[test_case("Production", Environment::Production; "capitalized")]
    fn test_parse(input: &str, expected: Environment) {
        assert_eq!(input.parse::<Environment>().unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "prod".parse::<Environment>().unwrap_err();
        assert!(err.to_string().contains("unknown environment"));
    }

    #[test]
    fn test_display_round_trip() {
        for env in [
            Environment::Production,
            Environment::Staging,
            Environment::Testing,
            Environment::Development,
        ] {
            assert_eq!(env.to_string().parse::<Environment>().unwrap(), env);
        }
    }

    #[test]
    fn test_default_is_development() {
        assert!(Environment::default().is_development());
    }
}
