use crate::domain::card::CardView;
use crate::error::Result;
use std::io::Write;

/// Writes the final card ledger as CSV.
///
/// One row per card: `number,holder,validity,status,balance`, numbers masked.
pub struct CardWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CardWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_cards(&mut self, cards: Vec<CardView>) -> Result<()> {
        self.writer
            .write_record(["number", "holder", "validity", "status", "balance"])?;
        for card in cards {
            let balance = card.balance.to_string();
            self.writer.write_record([
                card.number.as_str(),
                card.holder.as_str(),
                card.validity.as_str(),
                card.status.as_str(),
                balance.as_str(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
