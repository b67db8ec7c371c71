use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Register,
    Card,
    Block,
    Activate,
    Delete,
    Transfer,
}

/// One row of a batch operations file.
///
/// `user` is always the acting user (`register` creates it); the remaining
/// columns are op-specific and may be empty. `holder` names the card holder
/// for the `card` op.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Operation {
    pub op: OpKind,
    pub user: String,
    pub password: Option<String>,
    pub role: Option<String>,
    pub number: Option<String>,
    pub to_number: Option<String>,
    pub holder: Option<String>,
    pub validity: Option<String>,
    pub amount: Option<Decimal>,
}

/// Reads ledger operations from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// and yields rows lazily so large batches stream.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
