use crate::cli::args::{CliArgs, Command};
use crate::output;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(page_size) = args.page_size {
        if page_size == 0 {
            return Err("invalid --page-size, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid --timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        output::OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --fmt '{raw}', expected text, json, or csv"))?;
    }
    if let Some(Command::History(history)) = args.command.as_ref() {
        if history.pages == 0 {
            return Err("invalid --pages, expected positive integer".to_string());
        }
        if let Some(query) = history.search.as_deref() {
            if query.trim().is_empty() {
                return Err("invalid --search, expected a non-empty query".to_string());
            }
        }
    }
    if let Some(Command::Stats(stats)) = args.command.as_ref() {
        if stats.limit == Some(0) {
            return Err("invalid --limit, expected positive integer".to_string());
        }
    }
    Ok(())
}
