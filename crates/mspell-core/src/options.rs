//! Engine options and configuration
//!
//! Options can be built in code, read from JSON, or parsed from an rc-style
//! file of `OPTIONS=` lines:
//!
//! ```text
//! # casters learn but never peek
//! OPTIONS=smart_learn,!smart_cheat
//! OPTIONS=ally_safe_distance:3
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::geometry::{MAX_RANGE, RANGE_LIMIT};

/// Tunables for the decision engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Casters remember resistances their casts revealed
    pub smart_learn: bool,
    /// Casters see the target's true resistances
    pub smart_cheat: bool,
    /// Gate each turn on the race's casting frequency
    pub frequency_gate: bool,
    /// Non-innate abilities can fumble
    pub spell_failure: bool,
    /// Pets never blast within this many grids of their owner
    pub ally_safe_distance: u32,
    pub max_range: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            smart_learn: true,
            smart_cheat: false,
            frequency_gate: true,
            spell_failure: true,
            ally_safe_distance: 2,
            max_range: MAX_RANGE,
        }
    }
}

impl EngineOptions {
    /// Load options from an rc-style file
    pub fn load_from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_config(&contents)
    }

    /// Parse options from a config string
    pub fn parse_config(contents: &str) -> Result<Self, EngineError> {
        let mut options = Self::default();

        for line in contents.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(opts) = line.strip_prefix("OPTIONS=") {
                for opt in opts.split(',') {
                    options.parse_option(opt.trim())?;
                }
            }
        }

        Ok(options)
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let options: Self = serde_json::from_str(json)?;
        if options.max_range == 0 || options.max_range > RANGE_LIMIT {
            return Err(EngineError::InvalidValue(
                "max_range".to_string(),
                options.max_range.to_string(),
            ));
        }
        Ok(options)
    }

    /// Parse a single option
    fn parse_option(&mut self, opt: &str) -> Result<(), EngineError> {
        let (negated, opt_name) = if let Some(name) = opt.strip_prefix('!') {
            (true, name)
        } else if let Some(name) = opt.strip_prefix("no") {
            (true, name)
        } else {
            (false, opt)
        };

        if let Some((key, value)) = opt_name.split_once(':') {
            return self.set_option(key.trim(), value.trim());
        }
        if let Some((key, value)) = opt_name.split_once('=') {
            return self.set_option(key.trim(), value.trim());
        }

        self.set_bool_option(opt_name, !negated)
    }

    fn set_bool_option(&mut self, name: &str, value: bool) -> Result<(), EngineError> {
        match name {
            "smart_learn" => self.smart_learn = value,
            "smart_cheat" => self.smart_cheat = value,
            "frequency_gate" => self.frequency_gate = value,
            "spell_failure" => self.spell_failure = value,
            _ => return Err(EngineError::UnknownOption(name.to_string())),
        }
        Ok(())
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        let invalid = || EngineError::InvalidValue(name.to_string(), value.to_string());
        match name {
            "ally_safe_distance" => {
                self.ally_safe_distance = value.parse().map_err(|_| invalid())?;
            }
            "max_range" => {
                let range: u32 = value.parse().map_err(|_| invalid())?;
                if range == 0 || range > RANGE_LIMIT {
                    return Err(invalid());
                }
                self.max_range = range;
            }
            "smart_learn" | "smart_cheat" | "frequency_gate" | "spell_failure" => {
                let flag = match value.to_lowercase().as_str() {
                    "true" | "on" | "1" | "yes" => true,
                    "false" | "off" | "0" | "no" => false,
                    _ => return Err(invalid()),
                };
                self.set_bool_option(name, flag)?;
            }
            _ => return Err(EngineError::UnknownOption(name.to_string())),
        }
        Ok(())
    }

    /// Render the options as rc lines
    pub fn to_config(&self) -> String {
        let flag = |on: bool, name: &str| {
            if on {
                name.to_string()
            } else {
                format!("!{name}")
            }
        };
        [
            format!(
                "OPTIONS={},{},{},{}",
                flag(self.smart_learn, "smart_learn"),
                flag(self.smart_cheat, "smart_cheat"),
                flag(self.frequency_gate, "frequency_gate"),
                flag(self.spell_failure, "spell_failure"),
            ),
            format!("OPTIONS=ally_safe_distance:{}", self.ally_safe_distance),
            format!("OPTIONS=max_range:{}", self.max_range),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert!(options.smart_learn);
        assert!(!options.smart_cheat);
        assert_eq!(options.ally_safe_distance, 2);
        assert_eq!(options.max_range, MAX_RANGE);
    }

    #[test]
    fn test_parse_config_booleans() {
        let config = "# casters\nOPTIONS=!smart_learn,smart_cheat\n\nOPTIONS=nospell_failure";
        let options = EngineOptions::parse_config(config).unwrap();
        assert!(!options.smart_learn);
        assert!(options.smart_cheat);
        assert!(!options.spell_failure);
        assert!(options.frequency_gate);
    }

    #[test]
    fn test_parse_config_values() {
        let config = "OPTIONS=ally_safe_distance:3,max_range=12,smart_cheat:on";
        let options = EngineOptions::parse_config(config).unwrap();
        assert_eq!(options.ally_safe_distance, 3);
        assert_eq!(options.max_range, 12);
        assert!(options.smart_cheat);
    }

    #[test]
    fn test_parse_config_errors() {
        assert!(matches!(
            EngineOptions::parse_config("OPTIONS=telepathy"),
            Err(EngineError::UnknownOption(name)) if name == "telepathy"
        ));
        assert!(matches!(
            EngineOptions::parse_config("OPTIONS=max_range:0"),
            Err(EngineError::InvalidValue(..))
        ));
        assert!(matches!(
            EngineOptions::parse_config("OPTIONS=max_range:2147483647"),
            Err(EngineError::InvalidValue(..))
        ));
        assert!(matches!(
            EngineOptions::from_json(r#"{"max_range": 4294967295}"#),
            Err(EngineError::InvalidValue(..))
        ));
        assert!(matches!(
            EngineOptions::parse_config("OPTIONS=ally_safe_distance:far"),
            Err(EngineError::InvalidValue(..))
        ));
    }

    #[test]
    fn test_to_config_parses_back() {
        let options = EngineOptions {
            smart_cheat: true,
            frequency_gate: false,
            ally_safe_distance: 4,
            ..Default::default()
        };
        let parsed = EngineOptions::parse_config(&options.to_config()).unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let options = EngineOptions::from_json(r#"{"smart_cheat": true}"#).unwrap();
        assert!(options.smart_cheat);
        assert!(options.smart_learn);
        assert_eq!(options.max_range, MAX_RANGE);
    }
}
