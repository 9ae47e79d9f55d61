//! Report callback tokens and the report-choice menu.
//!
//! Tokens are ASCII and `_`-separated: `rpt[_<dim>]_<period>` where `<dim>`
//! is `bank` or `via` and `<period>` is one of `today`, `yesterday`, `week`,
//! `month`, `lastmonth` or `date_DD_MM_YYYY`.

use crate::integrations::bot_client::MenuButton;
use chrono::{Days, NaiveDate};
use shared_types::{Dimension, ReportError, ReportFilter};

const TOKEN_PREFIX: &str = "rpt_";
const TOKEN_DATE_FORMAT: &str = "%d_%m_%Y";
const BUTTON_DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Today,
    Yesterday,
    Date(NaiveDate),
    LastSevenDays,
    ThisMonth,
    LastMonth,
}

impl ReportPeriod {
    fn token_part(&self) -> String {
        match self {
            ReportPeriod::Today => "today".to_string(),
            ReportPeriod::Yesterday => "yesterday".to_string(),
            ReportPeriod::Date(day) => format!("date_{}", day.format(TOKEN_DATE_FORMAT)),
            ReportPeriod::LastSevenDays => "week".to_string(),
            ReportPeriod::ThisMonth => "month".to_string(),
            ReportPeriod::LastMonth => "lastmonth".to_string(),
        }
    }
}

/// What a report button asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportKind {
    pub period: ReportPeriod,
    /// Totals only when `None`
    pub breakdown: Option<Dimension>,
}

impl ReportKind {
    pub fn new(period: ReportPeriod, breakdown: Option<Dimension>) -> Self {
        Self { period, breakdown }
    }

    pub fn to_token(&self) -> String {
        let dim = match self.breakdown {
            None => "",
            Some(Dimension::Bank) => "bank_",
            Some(Dimension::Transport) => "via_",
        };
        format!("{TOKEN_PREFIX}{dim}{}", self.period.token_part())
    }

    pub fn from_token(token: &str) -> Result<Self, ReportError> {
        let unknown = || ReportError::UnknownReportKind(token.to_string());

        let rest = token.strip_prefix(TOKEN_PREFIX).ok_or_else(unknown)?;
        let (breakdown, rest) = if let Some(rest) = rest.strip_prefix("bank_") {
            (Some(Dimension::Bank), rest)
        } else if let Some(rest) = rest.strip_prefix("via_") {
            (Some(Dimension::Transport), rest)
        } else {
            (None, rest)
        };

        let period = match rest {
            "today" => ReportPeriod::Today,
            "yesterday" => ReportPeriod::Yesterday,
            "week" => ReportPeriod::LastSevenDays,
            "month" => ReportPeriod::ThisMonth,
            "lastmonth" => ReportPeriod::LastMonth,
            other => {
                let payload = other.strip_prefix("date_").ok_or_else(unknown)?;
                ReportPeriod::Date(parse_date_payload(token, payload)?)
            }
        };

        Ok(Self { period, breakdown })
    }
}

/// `DD_MM_YYYY`, strictly two, two and four digits
fn parse_date_payload(token: &str, payload: &str) -> Result<NaiveDate, ReportError> {
    let invalid = || ReportError::InvalidDateToken(token.to_string());

    let parts: Vec<&str> = payload.split('_').collect();
    let well_formed = matches!(parts.as_slice(), [d, m, y]
        if d.len() == 2 && m.len() == 2 && y.len() == 4
            && parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())));
    if !well_formed {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(payload, TOKEN_DATE_FORMAT).map_err(|_| invalid())
}

/// A parsed report ask bound to the chat it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub filter: ReportFilter,
}

/// Prompt text plus inline keyboard rows
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMenu {
    pub text: String,
    pub rows: Vec<Vec<MenuButton>>,
}

impl ReportMenu {
    /// Unescaped prompt for the given breakdown
    pub fn prompt(breakdown: Option<Dimension>) -> &'static str {
        match breakdown {
            None => "Choose a report period:",
            Some(Dimension::Bank) => "Choose a period for the bank breakdown:",
            Some(Dimension::Transport) => "Choose a period for the transport breakdown:",
        }
    }

    /// Button rows for a chat whose local date is `today`
    pub fn rows(
        breakdown: Option<Dimension>,
        today: NaiveDate,
        recent_days: u32,
    ) -> Vec<Vec<MenuButton>> {
        let button = |label: String, period| {
            MenuButton::new(label, ReportKind::new(period, breakdown).to_token())
        };

        let mut rows = vec![vec![
            button("Today".to_string(), ReportPeriod::Today),
            button("Yesterday".to_string(), ReportPeriod::Yesterday),
        ]];

        let recent: Vec<MenuButton> = (2..2 + u64::from(recent_days))
            .filter_map(|back| today.checked_sub_days(Days::new(back)))
            .map(|day| button(day.format(BUTTON_DATE_FORMAT).to_string(), ReportPeriod::Date(day)))
            .collect();
        if !recent.is_empty() {
            rows.push(recent);
        }

        rows.push(vec![button("Last 7 days".to_string(), ReportPeriod::LastSevenDays)]);
        rows.push(vec![
            button("This month".to_string(), ReportPeriod::ThisMonth),
            button("Last month".to_string(), ReportPeriod::LastMonth),
        ]);

        rows
    }
}
