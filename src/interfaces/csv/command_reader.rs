use crate::domain::booking::ItineraryKind;
use crate::domain::payment::{PaymentKind, PaymentMethod, ReviewOutcome};
use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Create,
    Submit,
    Approve,
    Reject,
    Reconsider,
    Resolve,
    Unresolve,
    Cancel,
    Delete,
    EditTotal,
    Pay,
    Review,
}

/// One line of a command script.
///
/// `booking` is the booking code. `payment` is a label the script gives a
/// submission on `pay` so that a later `review` can refer to it.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub action: CommandAction,
    pub booking: String,
    pub payment: Option<String>,
    pub amount: Option<Decimal>,
    pub method: Option<PaymentMethod>,
    pub kind: Option<PaymentKind>,
    pub outcome: Option<ReviewOutcome>,
    pub proof: Option<String>,
    pub reason: Option<String>,
    pub resolution: Option<String>,
    pub customer: Option<String>,
    pub contact: Option<String>,
    pub itinerary: Option<String>,
    pub itinerary_kind: Option<ItineraryKind>,
    pub travel_date: Option<NaiveDate>,
    pub travelers: Option<u16>,
}

/// Reads commands from a CSV source.
///
/// Whitespace is trimmed and rows may omit trailing columns they do not use.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes commands, one `Result` per row.
    pub fn commands(self) -> impl Iterator<Item = Result<CommandRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(EngineError::from))
    }
}
