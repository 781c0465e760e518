use crate::domain::account::Account;
use crate::error::Result;
use std::io::Write;

/// Writes the final account summary as CSV, sorted by email for stable
/// output.
pub struct SummaryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> SummaryWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_accounts(&mut self, mut accounts: Vec<Account>) -> Result<()> {
        accounts.sort_by(|a, b| a.email.cmp(&b.email));
        self.writer.write_record(["email", "role", "credits"])?;
        for account in accounts {
            self.writer.write_record([
                account.email.as_str(),
                &account.role.to_string(),
                &account.credits.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
