//! # Run identity encoding
//!
//! A work unit (one processing run of one brick) is identified by a tuple of
//! declared integer keys. The scheme maps the tuple bijectively to a short
//! string (`"file1_rs2_skip3"`) and, through [`crate::runs::paths`], to a
//! canonical output path. Encode and decode are pure computations, so
//! uncoordinated parallel workers derive disjoint filesystem namespaces from
//! their tuples with no locking: that bijection is the concurrency contract
//! of the whole system.
//!
//! Defaults are pinned per scheme version ([`SIM_ID_V1`]) and passed
//! explicitly, never read from mutable global state, so historical outputs
//! stay addressable across scheme revisions.

use regex::Regex;

use crate::skysim_errors::SkysimError;

/// One declared key of a [`SimIdScheme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimIdKey {
    pub name: &'static str,
    /// Literal prefix of the key in the encoded string.
    pub prefix: &'static str,
    pub default: i64,
}

/// Ordered key→value mapping, default-filled; values follow the scheme's key
/// order.
pub type SimIdValues = Vec<(&'static str, i64)>;

/// Versioned, immutable declaration of the run-identity keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimIdScheme {
    keys: &'static [SimIdKey],
}

/// Version 1 of the run-identity scheme: input file id, starting row, and
/// skip pass id, all defaulting to 0.
pub static SIM_ID_V1: SimIdScheme = SimIdScheme {
    keys: &[
        SimIdKey {
            name: "fileid",
            prefix: "file",
            default: 0,
        },
        SimIdKey {
            name: "rowstart",
            prefix: "rs",
            default: 0,
        },
        SimIdKey {
            name: "skipid",
            prefix: "skip",
            default: 0,
        },
    ],
};

impl SimIdScheme {
    pub fn keys(&self) -> &'static [SimIdKey] {
        self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Canonical format string of the encoded id, e.g. `"file{}_rs{}_skip{}"`.
    pub fn template(&self) -> String {
        self.keys
            .iter()
            .map(|k| format!("{}{{}}", k.prefix))
            .collect::<Vec<_>>()
            .join("_")
    }

    fn check_known(&self, overrides: &[(&str, i64)]) -> Result<(), SkysimError> {
        for &(name, _) in overrides {
            if !self.keys.iter().any(|k| k.name == name) {
                return Err(SkysimError::UnknownKey(name.to_string()));
            }
        }
        Ok(())
    }

    /// Ordered values, defaults filling unspecified keys.
    pub fn as_list(&self, overrides: &[(&str, i64)]) -> Result<Vec<i64>, SkysimError> {
        self.check_known(overrides)?;
        Ok(self
            .keys
            .iter()
            .map(|k| {
                overrides
                    .iter()
                    .rev()
                    .find(|&&(name, _)| name == k.name)
                    .map_or(k.default, |&(_, value)| value)
            })
            .collect())
    }

    /// Key→value mapping, defaults filling unspecified keys.
    pub fn as_dict(&self, overrides: &[(&str, i64)]) -> Result<SimIdValues, SkysimError> {
        let values = self.as_list(overrides)?;
        Ok(self
            .keys
            .iter()
            .zip(values)
            .map(|(k, v)| (k.name, v))
            .collect())
    }

    /// Encoded id string, defaults filling unspecified keys.
    ///
    /// Fails with [`SkysimError::UnknownKey`] for any undeclared key name.
    pub fn encode(&self, overrides: &[(&str, i64)]) -> Result<String, SkysimError> {
        Ok(self.encode_values(&self.as_list(overrides)?))
    }

    /// Encoded id string from a full ordered value tuple.
    pub fn encode_values(&self, values: &[i64]) -> String {
        self.keys
            .iter()
            .zip(values)
            .map(|(k, v)| format!("{}{}", k.prefix, v))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Inverse of [`encode`](Self::encode).
    ///
    /// Round-trip law: `decode(encode(k)) == as_dict(k)` for every valid `k`.
    pub fn decode(&self, encoded: &str) -> Result<SimIdValues, SkysimError> {
        let values = self.decode_values(encoded)?;
        Ok(self
            .keys
            .iter()
            .zip(values)
            .map(|(k, v)| (k.name, v))
            .collect())
    }

    /// Ordered value tuple parsed from an encoded id string.
    pub fn decode_values(&self, encoded: &str) -> Result<Vec<i64>, SkysimError> {
        let re = self.regex(&[])?;
        let caps = re.captures(encoded).ok_or_else(|| {
            SkysimError::ParseError(format!(
                "'{}' does not match sim-id template '{}'",
                encoded,
                self.template()
            ))
        })?;
        self.keys
            .iter()
            .enumerate()
            .map(|(i, k)| {
                caps.get(i + 1)
                    .ok_or_else(|| {
                        SkysimError::ParseError(format!("missing sim-id key '{}'", k.name))
                    })?
                    .as_str()
                    .parse::<i64>()
                    .map_err(|e| {
                        SkysimError::ParseError(format!(
                            "sim-id key '{}' in '{}': {}",
                            k.name, encoded, e
                        ))
                    })
            })
            .collect()
    }

    /// Wildcard pattern with the given keys pinned and every other key set to
    /// `*`, for glob-style directory scans.
    pub fn match_template(&self, pinned: &[(&str, i64)]) -> Result<String, SkysimError> {
        self.check_known(pinned)?;
        Ok(self
            .keys
            .iter()
            .map(|k| {
                match pinned.iter().rev().find(|&&(name, _)| name == k.name) {
                    Some(&(_, value)) => format!("{}{}", k.prefix, value),
                    None => format!("{}*", k.prefix),
                }
            })
            .collect::<Vec<_>>()
            .join("_"))
    }

    /// Anchored regex equivalent of [`match_template`](Self::match_template);
    /// unpinned keys capture any integer value.
    pub fn regex(&self, pinned: &[(&str, i64)]) -> Result<Regex, SkysimError> {
        self.check_known(pinned)?;
        let body = self
            .keys
            .iter()
            .map(|k| {
                let value = match pinned.iter().rev().find(|&&(name, _)| name == k.name) {
                    Some(&(_, v)) => regex::escape(&v.to_string()),
                    None => "-?\\d+".to_string(),
                };
                format!("{}({})", regex::escape(k.prefix), value)
            })
            .collect::<Vec<_>>()
            .join("_");
        Regex::new(&format!("^{body}$")).map_err(|e| {
            SkysimError::ParseError(format!("sim-id template regex: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_and_decode_scenario() {
        let encoded = SIM_ID_V1
            .encode(&[("fileid", 1), ("rowstart", 2), ("skipid", 3)])
            .unwrap();
        assert_eq!(encoded, "file1_rs2_skip3");
        let decoded = SIM_ID_V1.decode("file1_rs2_skip3").unwrap();
        assert_eq!(decoded, vec![("fileid", 1), ("rowstart", 2), ("skipid", 3)]);
    }

    #[test]
    fn defaults_fill_unspecified_keys() {
        assert_eq!(SIM_ID_V1.encode(&[]).unwrap(), "file0_rs0_skip0");
        assert_eq!(
            SIM_ID_V1.as_list(&[("rowstart", 700)]).unwrap(),
            vec![0, 700, 0]
        );
        assert_eq!(SIM_ID_V1.len(), SIM_ID_V1.as_list(&[]).unwrap().len());
    }

    #[test]
    fn round_trip_law() {
        for overrides in [
            vec![],
            vec![("fileid", 5)],
            vec![("skipid", 2), ("rowstart", 3000)],
            vec![("fileid", -1)],
        ] {
            let encoded = SIM_ID_V1.encode(&overrides).unwrap();
            assert_eq!(
                SIM_ID_V1.decode(&encoded).unwrap(),
                SIM_ID_V1.as_dict(&overrides).unwrap(),
                "round trip of {overrides:?}"
            );
        }
    }

    #[test]
    fn unknown_key_rejected() {
        let err = SIM_ID_V1.encode(&[("zoom", 1)]).unwrap_err();
        assert_eq!(err, SkysimError::UnknownKey("zoom".to_string()));
    }

    #[test]
    fn nonconforming_string_rejected() {
        for bad in ["", "file1", "file1_rs2", "file1_rs2_skip3_extra", "filex_rs2_skip3"] {
            assert!(
                matches!(SIM_ID_V1.decode(bad), Err(SkysimError::ParseError(_))),
                "'{bad}' should not decode"
            );
        }
    }

    #[test]
    fn template_and_match_template() {
        assert_eq!(SIM_ID_V1.template(), "file{}_rs{}_skip{}");
        assert_eq!(
            SIM_ID_V1.match_template(&[]).unwrap(),
            "file*_rs*_skip*"
        );
        assert_eq!(
            SIM_ID_V1.match_template(&[("skipid", 4)]).unwrap(),
            "file*_rs*_skip4"
        );
    }

    #[test]
    fn pinned_regex_filters_directories() {
        let re = SIM_ID_V1.regex(&[("skipid", 4)]).unwrap();
        assert!(re.is_match("file1_rs2_skip4"));
        assert!(!re.is_match("file1_rs2_skip5"));
        assert!(!re.is_match("merged"));
    }
}
