use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::lifecycle::{Period, ValidationError};
use crate::reminders::ReminderPreference;

pub mod commands;

#[derive(Parser)]
#[command(name = "ledger-portal")]
#[command(about = "Client-side monthly document submission for the bookkeeping portal")]
#[command(long_about = "Upload the monthly sales, purchase and bank documents to your bookkeeper, \
                       add notes and lock the month once it is complete. Start with \
                       'ledger-portal status --year Y --month M' to see where a month stands.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Year and month the command works on. Both are required.
#[derive(Args, Debug, Clone, Copy)]
pub struct PeriodArgs {
    /// Calendar year of the month
    #[arg(long, help = "Year of the month to work on (2000-2100)")]
    pub year: Option<i32>,
    /// Calendar month (1-12)
    #[arg(long, help = "Month to work on (1-12)")]
    pub month: Option<u32>,
}

impl PeriodArgs {
    pub fn period(&self) -> Result<Period, ValidationError> {
        Period::from_selection(self.year, self.month)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show documents, lock state, notes and reminders for a month
    Status {
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Upload or replace documents for a month
    Upload {
        #[command(flatten)]
        period: PeriodArgs,
        /// Sales document
        #[arg(long, help = "Path to the sales document")]
        sales: Option<PathBuf>,
        /// Purchase document
        #[arg(long, help = "Path to the purchase document")]
        purchase: Option<PathBuf>,
        /// Bank statement
        #[arg(long, help = "Path to the bank statement")]
        bank: Option<PathBuf>,
        /// Additional category documents
        #[arg(long = "other", value_name = "NAME=PATH", value_parser = parse_other_document,
              help = "Document for an additional category, e.g. --other Payroll=payroll.xlsx")]
        other: Vec<(String, PathBuf)>,
        /// Note attached to every uploaded document
        #[arg(long, help = "Note explaining the change (required when replacing files after unlock)")]
        note: Option<String>,
        /// Lock the month after the uploads succeed
        #[arg(long, help = "Lock the month once all uploads went through")]
        lock: bool,
        /// Note sent with the lock
        #[arg(long, help = "Month note sent with --lock (required after updating a reopened month)")]
        month_note: Option<String>,
    },
    /// Lock a month so the bookkeeper can start working on it
    Lock {
        #[command(flatten)]
        period: PeriodArgs,
        /// Note sent with the lock
        #[arg(long, help = "Note describing what changed since the month was reopened")]
        month_note: Option<String>,
    },
    /// Show or answer the payment reminder for a month
    Remind {
        #[command(flatten)]
        period: PeriodArgs,
        /// New answer for the reminder
        #[arg(long, value_name = "unset|will-pay|paid", help = "Record your answer to the payment reminder")]
        set: Option<ReminderPreference>,
    },
}

fn parse_other_document(raw: &str) -> Result<(String, PathBuf), String> {
    let (name, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("category name must not be empty".to_string());
    }
    if path.trim().is_empty() {
        return Err(format!("missing file path for category '{name}'"));
    }
    Ok((name.to_string(), PathBuf::from(path.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_other_document() {
        let (name, path) = parse_other_document("Payroll=docs/payroll.xlsx").unwrap();
        assert_eq!(name, "Payroll");
        assert_eq!(path, PathBuf::from("docs/payroll.xlsx"));

        assert!(parse_other_document("Payroll").is_err());
        assert!(parse_other_document(" =x.pdf").is_err());
        assert!(parse_other_document("Payroll=").is_err());
    }

    #[test]
    fn test_upload_arguments_parse() {
        let cli = Cli::try_parse_from([
            "ledger-portal",
            "upload",
            "--year",
            "2026",
            "--month",
            "3",
            "--sales",
            "sales.pdf",
            "--other",
            "Payroll=payroll.xlsx",
            "--other",
            "Rent=rent.pdf",
            "--note",
            "fixed totals",
            "--lock",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Upload {
                period,
                sales,
                other,
                note,
                lock,
                ..
            }) => {
                assert_eq!(period.period().unwrap(), Period::new(2026, 3).unwrap());
                assert_eq!(sales, Some(PathBuf::from("sales.pdf")));
                assert_eq!(other.len(), 2);
                assert_eq!(note.as_deref(), Some("fixed totals"));
                assert!(lock);
            }
            _ => panic!("expected upload command"),
        }
    }

    #[test]
    fn test_missing_month_is_a_validation_error() {
        let cli = Cli::try_parse_from(["ledger-portal", "status", "--year", "2026"]).unwrap();
        match cli.command {
            Some(Commands::Status { period }) => {
                assert_eq!(period.period(), Err(ValidationError::MissingPeriod));
            }
            _ => panic!("expected status command"),
        }
    }

    #[test]
    fn test_remind_parses_preference() {
        let cli = Cli::try_parse_from([
            "ledger-portal",
            "remind",
            "--year",
            "2026",
            "--month",
            "1",
            "--set",
            "will-pay",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Remind { set, .. }) => {
                assert_eq!(set, Some(ReminderPreference::WillPay));
            }
            _ => panic!("expected remind command"),
        }
    }
}
