use super::domain::ColumnRole;
use super::DrawOrderError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Resolved column name per semantic role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    columns: BTreeMap<ColumnRole, Option<String>>,
}

impl ColumnMap {
    /// Maps every role onto the table's columns, failing when a required role is unresolved.
    pub fn resolve(columns: &[String]) -> Result<Self, DrawOrderError> {
        let map = Self::infer(columns);
        let missing: Vec<ColumnRole> = ColumnRole::ordered()
            .into_iter()
            .filter(|role| role.is_required() && map.column(*role).is_none())
            .collect();

        if missing.is_empty() {
            Ok(map)
        } else {
            Err(DrawOrderError::MissingColumns {
                missing,
                detected: columns.to_vec(),
            })
        }
    }

    /// Best-effort mapping that leaves unresolved roles empty.
    pub fn infer(columns: &[String]) -> Self {
        let columns = ColumnRole::ordered()
            .into_iter()
            .map(|role| (role, resolve_column(columns, role.candidates()).map(str::to_string)))
            .collect();

        Self { columns }
    }

    pub fn column(&self, role: ColumnRole) -> Option<&str> {
        self.columns.get(&role).and_then(|column| column.as_deref())
    }

    pub fn entries(&self) -> &BTreeMap<ColumnRole, Option<String>> {
        &self.columns
    }

    /// Resolved columns in role order, skipping unresolved optional roles.
    pub fn display_columns(&self) -> Vec<&str> {
        ColumnRole::ordered()
            .into_iter()
            .filter_map(|role| self.column(role))
            .collect()
    }
}

/// Case-insensitive exact match first, then substring match, candidates in priority order.
pub fn resolve_column<'a>(columns: &'a [String], candidates: &[&str]) -> Option<&'a str> {
    let lowered: Vec<String> = columns.iter().map(|name| name.to_lowercase()).collect();

    let exact = candidates.iter().find_map(|candidate| {
        let candidate = candidate.to_lowercase();
        lowered.iter().position(|name| *name == candidate)
    });

    exact
        .or_else(|| {
            candidates.iter().find_map(|candidate| {
                let candidate = candidate.to_lowercase();
                lowered.iter().position(|name| name.contains(&candidate))
            })
        })
        .map(|index| columns[index].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn exact_match_beats_substring_match() {
        let columns = columns(&["Interest Rate", "ROI"]);
        assert_eq!(
            resolve_column(&columns, ColumnRole::Roi.candidates()),
            Some("ROI")
        );
    }

    #[test]
    fn candidate_order_decides_between_columns() {
        let columns = columns(&["Date", "Availability Date"]);
        assert_eq!(
            resolve_column(&columns, ColumnRole::Date.candidates()),
            Some("Availability Date")
        );
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let columns = columns(&["Line", "Proposed DRAW AMOUNT (INR)", "roi %"]);
        assert_eq!(
            resolve_column(&columns, ColumnRole::Amount.candidates()),
            Some("Proposed DRAW AMOUNT (INR)")
        );
        assert_eq!(
            resolve_column(&columns, ColumnRole::Roi.candidates()),
            Some("roi %")
        );
    }

    #[test]
    fn resolve_reports_every_missing_required_role() {
        let detected = columns(&["Lender", "Tenor"]);
        match ColumnMap::resolve(&detected) {
            Err(DrawOrderError::MissingColumns { missing, detected }) => {
                assert_eq!(
                    missing,
                    vec![ColumnRole::Date, ColumnRole::Roi, ColumnRole::Amount]
                );
                assert_eq!(detected, vec!["Lender", "Tenor"]);
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn optional_roles_may_stay_unresolved() {
        let map = ColumnMap::resolve(&columns(&["Available On", "Rate", "Amt"])).expect("map");
        assert_eq!(map.column(ColumnRole::Date), Some("Available On"));
        assert_eq!(map.column(ColumnRole::Tenor), None);
        assert_eq!(map.display_columns(), vec!["Available On", "Rate", "Amt"]);
    }
}
