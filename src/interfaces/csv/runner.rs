use super::command_reader::{CommandAction, CommandRecord};
use crate::application::engine::BookingEngine;
use crate::domain::booking::{BookingDraft, BookingId, ItineraryRef};
use crate::domain::money::Money;
use crate::domain::payment::{PaymentRequest, ProofRef, SubmissionId};
use crate::error::{EngineError, Result};
use std::collections::HashMap;
use tracing::warn;

/// Outcome counts of a batch run.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct RunSummary {
    pub applied: usize,
    pub rejected: usize,
}

/// Applies command records to a `BookingEngine`.
///
/// Bookings are addressed by code. Submissions are addressed by the label the
/// script gave them on `pay`; a label only resolves for the booking it was paid
/// against, and labels live only as long as the runner.
pub struct CommandRunner<'a> {
    engine: &'a BookingEngine,
    labels: HashMap<String, (BookingId, SubmissionId)>,
}

impl<'a> CommandRunner<'a> {
    pub fn new(engine: &'a BookingEngine) -> Self {
        Self {
            engine,
            labels: HashMap::new(),
        }
    }

    /// Applies every command, logging and counting failures instead of stopping.
    pub async fn run<I>(&mut self, commands: I) -> RunSummary
    where
        I: IntoIterator<Item = Result<CommandRecord>>,
    {
        let mut summary = RunSummary::default();
        for (index, command) in commands.into_iter().enumerate() {
            let line = index + 2;
            let outcome = match command {
                Ok(command) => self.apply(command).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => summary.applied += 1,
                Err(e) => {
                    summary.rejected += 1;
                    warn!(line, error = %e, "command rejected");
                }
            }
        }
        summary
    }

    pub async fn apply(&mut self, command: CommandRecord) -> Result<()> {
        match command.action {
            CommandAction::Create => self.create(&command).await?,
            CommandAction::Submit => {
                let id = self.booking_id(&command).await?;
                self.engine.submit_booking(id).await?;
            }
            CommandAction::Approve => {
                let id = self.booking_id(&command).await?;
                self.engine.approve_booking(id).await?;
            }
            CommandAction::Reject => {
                let id = self.booking_id(&command).await?;
                let (reason, resolution) = notes(&command);
                self.engine.reject_booking(id, reason, resolution).await?;
            }
            CommandAction::Reconsider => {
                let id = self.booking_id(&command).await?;
                self.engine.reconsider_booking(id).await?;
            }
            CommandAction::Resolve => {
                let id = self.booking_id(&command).await?;
                self.engine.mark_resolved(id).await?;
            }
            CommandAction::Unresolve => {
                let id = self.booking_id(&command).await?;
                let (reason, resolution) = notes(&command);
                self.engine.mark_unresolved(id, reason, resolution).await?;
            }
            CommandAction::Cancel => {
                let id = self.booking_id(&command).await?;
                self.engine.cancel_booking(id).await?;
            }
            CommandAction::Delete => {
                let id = self.booking_id(&command).await?;
                self.engine.delete_booking(id).await?;
            }
            CommandAction::EditTotal => {
                let id = self.booking_id(&command).await?;
                let amount = required_amount(&command, "edit_total")?;
                self.engine.edit_total_amount(id, amount).await?;
            }
            CommandAction::Pay => {
                let id = self.booking_id(&command).await?;
                let label = required(&command.payment, "payment", "pay")?.to_string();
                if self.labels.contains_key(&label) {
                    return Err(EngineError::ValidationError(format!(
                        "payment label {label} is already in use"
                    )));
                }
                let request = PaymentRequest {
                    booking_id: id,
                    amount: command.amount.map(Money::from_decimal).transpose()?,
                    method: command.method.ok_or_else(|| missing("method", "pay"))?,
                    kind: command.kind.ok_or_else(|| missing("kind", "pay"))?,
                    proof: command
                        .proof
                        .clone()
                        .filter(|proof| !proof.is_empty())
                        .map(ProofRef),
                };
                let submission = self.engine.submit_payment(request).await?;
                self.labels.insert(label, (id, submission.id));
            }
            CommandAction::Review => {
                let id = self.booking_id(&command).await?;
                let label = required(&command.payment, "payment", "review")?;
                let submission_id = match self.labels.get(label) {
                    Some(&(owner, submission_id)) if owner == id => submission_id,
                    _ => {
                        return Err(EngineError::NotFound(format!(
                            "payment {label} of booking {}",
                            command.booking
                        )));
                    }
                };
                let outcome = command.outcome.ok_or_else(|| missing("outcome", "review"))?;
                self.engine.verify_payment(submission_id, outcome).await?;
            }
        }
        Ok(())
    }

    async fn booking_id(&self, command: &CommandRecord) -> Result<BookingId> {
        Ok(self.engine.find_by_code(&command.booking).await?.id)
    }

    async fn create(&self, command: &CommandRecord) -> Result<()> {
        let draft = BookingDraft {
            code: Some(command.booking.clone()),
            customer_name: command.customer.clone().unwrap_or_default(),
            contact: command.contact.clone().unwrap_or_default(),
            itinerary: ItineraryRef(command.itinerary.clone().unwrap_or_default()),
            itinerary_kind: command.itinerary_kind.unwrap_or_default(),
            travel_date: command.travel_date,
            travelers: command.travelers.unwrap_or(1),
            total_amount: required_amount(command, "create")?,
        };
        self.engine.create_booking(draft).await?;
        Ok(())
    }
}

fn missing(field: &str, action: &str) -> EngineError {
    EngineError::ValidationError(format!("{action} requires {field}"))
}

fn required<'r>(value: &'r Option<String>, field: &str, action: &str) -> Result<&'r str> {
    value
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| missing(field, action))
}

fn required_amount(command: &CommandRecord, action: &str) -> Result<Money> {
    let amount = command.amount.ok_or_else(|| missing("amount", action))?;
    Money::from_decimal(amount)
}

/// Empty notes are left for the rejection record to refuse.
fn notes(command: &CommandRecord) -> (&str, &str) {
    (
        command.reason.as_deref().unwrap_or_default(),
        command.resolution.as_deref().unwrap_or_default(),
    )
}
