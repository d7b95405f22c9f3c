use std::collections::HashMap;

/// Strips invisible characters and collapses runs of whitespace. Case is preserved.
pub(crate) fn clean_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleans every header, names blanks `Col{n}`, and suffixes repeats with `.1`, `.2`, ...
pub(crate) fn unique_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::new();

    for (position, value) in raw.into_iter().enumerate() {
        let mut name = clean_header(value.as_ref());
        if name.is_empty() {
            name = format!("Col{}", position + 1);
        }

        let repeats = seen.entry(name.clone()).or_insert(0);
        let unique = if *repeats == 0 {
            name
        } else {
            format!("{name}.{repeats}")
        };
        *repeats += 1;
        headers.push(unique);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_header_removes_bom_and_extra_whitespace() {
        assert_eq!(
            clean_header("\u{feff}  Date   of\tavailability "),
            "Date of availability"
        );
    }

    #[test]
    fn unique_headers_fills_blanks_and_disambiguates() {
        let headers = unique_headers(["ROI", "", "ROI", " ROI ", "Amount"]);
        assert_eq!(headers, vec!["ROI", "Col2", "ROI.1", "ROI.2", "Amount"]);
    }
}
