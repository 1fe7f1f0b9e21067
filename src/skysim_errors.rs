use thiserror::Error;

/// Crate-wide error type.
///
/// Every failure carries the offending identifier (column name, brick name,
/// sim-id key, path...) so that batch drivers can report which unit failed
/// without re-deriving context.
#[derive(Error, Debug)]
pub enum SkysimError {
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("position (ra={ra}, dec={dec}) is outside the survey footprint")]
    OutOfFootprint { ra: f64, dec: f64 },

    #[error("unknown sim-id key: {0}")]
    UnknownKey(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("duplicate run: brick {brickname}, sim id {sim_id}")]
    DuplicateRun { brickname: String, sim_id: String },

    #[error("unable to perform file operation: {0}")]
    Io(#[from] std::io::Error),

    #[error("tabular store error: {0}")]
    Csv(#[from] csv::Error),
}

impl PartialEq for SkysimError {
    fn eq(&self, other: &Self) -> bool {
        use SkysimError::*;
        match (self, other) {
            (SchemaMismatch(a), SchemaMismatch(b)) => a == b,
            (NotFound(a), NotFound(b)) => a == b,
            (OutOfFootprint { ra: a, dec: b }, OutOfFootprint { ra: c, dec: d }) => {
                a == c && b == d
            }
            (UnknownKey(a), UnknownKey(b)) => a == b,
            (ParseError(a), ParseError(b)) => a == b,
            (
                DuplicateRun {
                    brickname: a,
                    sim_id: b,
                },
                DuplicateRun {
                    brickname: c,
                    sim_id: d,
                },
            ) => a == c && b == d,

            // Underlying error types are not comparable: equal if same variant.
            (Io(_), Io(_)) => true,
            (Csv(_), Csv(_)) => true,

            _ => false,
        }
    }
}
