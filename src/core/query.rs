use serde::{Deserialize, Serialize};

/// Structured search criteria, composed into an expert query.
///
/// Only composes; the resulting string is passed to the API untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpertQuery {
    pub full_text: Option<String>,
    /// NUTS code of the place of performance, e.g. `DE73`.
    pub place_of_performance: Option<String>,
    pub cpv: Option<String>,
    /// CPV code on lot level.
    pub cpv_lot: Option<String>,
    pub notice_type: Option<String>,
    pub procedure_type: Option<String>,
    pub contract_nature: Option<String>,
    pub legal_basis: Option<String>,
    /// `YYYYMMDD` or `YYYY-MM-DD`.
    pub published_from: Option<String>,
    pub published_to: Option<String>,
    pub deadline_before: Option<String>,
    pub buyer_name: Option<String>,
    pub buyer_country: Option<String>,
    pub authority_activity: Option<String>,
    pub lot_number: Option<String>,
    pub publication_number: Option<String>,
    /// Official Journal issue, e.g. `2025/123`.
    pub gazette_issue: Option<String>,
}

impl ExpertQuery {
    pub fn is_empty(&self) -> bool {
        self.build().is_none()
    }

    /// Criteria joined with `AND`; `None` when nothing is set.
    pub fn build(&self) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();

        if let Some(text) = present(&self.full_text) {
            parts.push(format!("FT~(\"{}\")", escape(text)));
        }
        push_quoted(&mut parts, "RC", &self.place_of_performance);
        push_quoted(&mut parts, "PC", &self.cpv);
        push_quoted(&mut parts, "classification-cpv-lot", &self.cpv_lot);
        push_quoted(&mut parts, "notice-type", &self.notice_type);
        push_quoted(&mut parts, "PR", &self.procedure_type);
        push_quoted(&mut parts, "NC", &self.contract_nature);
        push_quoted(&mut parts, "legal-basis-notice", &self.legal_basis);

        match (present(&self.published_from), present(&self.published_to)) {
            (Some(from), Some(to)) => {
                parts.push(format!("PD=[{} TO {}]", compact_date(from), compact_date(to)))
            }
            (Some(from), None) => parts.push(format!("PD>={}", compact_date(from))),
            (None, Some(to)) => parts.push(format!("PD<={}", compact_date(to))),
            (None, None) => {}
        }
        if let Some(deadline) = present(&self.deadline_before) {
            parts.push(format!(
                "deadline-receipt-tender-date-lot<={}",
                compact_date(deadline)
            ));
        }

        push_quoted(&mut parts, "AU", &self.buyer_name);
        push_quoted(&mut parts, "CY", &self.buyer_country);
        push_quoted(&mut parts, "authority-main-activity", &self.authority_activity);
        push_quoted(&mut parts, "lot-included-proc", &self.lot_number);
        push_quoted(&mut parts, "ND", &self.publication_number);
        push_quoted(&mut parts, "gazette-issue-id", &self.gazette_issue);

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" AND "))
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn push_quoted(parts: &mut Vec<String>, field: &str, value: &Option<String>) {
    if let Some(value) = present(value) {
        parts.push(format!("{}=\"{}\"", field, escape(value)));
    }
}

fn escape(value: &str) -> String {
    value.replace('"', "\\\"")
}

fn compact_date(date: &str) -> String {
    date.replace('-', "")
}
