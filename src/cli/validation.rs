use crate::cli::args::{CliArgs, Command, FilterArgs};

fn validate_filters(filters: &FilterArgs) -> Result<(), String> {
    if let Some(raw) = filters.status.as_deref() {
        if crate::filters::UserStatus::parse(raw).is_none() {
            return Err(format!(
                "invalid --status '{raw}', expected all, active or inactive"
            ));
        }
    }
    if let Some(raw) = filters.from.as_deref() {
        if !raw.trim().is_empty() {
            crate::utils::parse_date(raw).map_err(|e| format!("invalid --from: {e}"))?;
        }
    }
    Ok(())
}

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.url.as_deref() {
        crate::utils::parse_page_url(raw).map_err(|e| format!("invalid --url '{raw}': {e}"))?;
    }
    if let Some(raw) = args.header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    if args.timeout == Some(0) {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    match &args.command {
        Command::Report(report) => {
            validate_filters(&report.filters)?;
            for column in report.sort.iter() {
                if crate::table::Column::parse(column).is_none() {
                    return Err(format!("invalid --sort '{column}': unknown column"));
                }
            }
            if let Some(raw) = report.format.as_deref() {
                if crate::output::OutputFormat::parse(raw).is_none() {
                    return Err(format!(
                        "invalid --format '{raw}', expected text, json, csv or html"
                    ));
                }
            }
        }
        Command::Download(download) => validate_filters(&download.filters)?,
        Command::Users { text } if text.trim().is_empty() => {
            return Err("users: search text is empty".to_string());
        }
        _ => {}
    }
    Ok(())
}
