use std::collections::HashMap;

use super::executor::ImportError;

/// One data row of the uploaded CSV, keyed by header name
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    /// 1-based line in the file, header being line 1
    pub line: usize,
    cells: HashMap<String, String>,
}

impl ImportRow {
    pub fn new(line: usize, cells: HashMap<String, String>) -> Self {
        Self { line, cells }
    }

    /// Trimmed cell value, empty when the row has no such column
    pub fn cell(&self, header: &str) -> &str {
        self.cells.get(header).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<ImportRow>,
}

impl CsvTable {
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name.trim())
    }
}

/// Decode the uploaded bytes as UTF-8, dropping a leading BOM
pub fn decode_upload(bytes: &[u8]) -> Result<&str, ImportError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ImportError::InvalidEncoding(e.to_string()))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Parse CSV text with a header row.
///
/// Records may be ragged. Rows whose cells are all blank are dropped before
/// line numbers are assigned, so the n-th kept row is reported as line n + 1.
pub fn parse_csv(text: &str) -> Result<CsvTable, ImportError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::MalformedCsv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::MalformedCsv(e.to_string()))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut cells = HashMap::with_capacity(headers.len());
        for (idx, header) in headers.iter().enumerate() {
            let value = record.get(idx).unwrap_or("").trim().to_string();
            // first column wins when a header is repeated
            cells.entry(header.clone()).or_insert(value);
        }

        let line = rows.len() + 2;
        rows.push(ImportRow::new(line, cells));
    }

    Ok(CsvTable { headers, rows })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedRevenue {
    pub value: f64,
    pub is_zero_or_empty: bool,
}

/// Longest leading decimal number of `s` (sign, digits, fraction, exponent),
/// ignoring whatever text follows it. None when `s` does not start with one.
fn leading_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = match bytes.first() {
        Some(b'+' | b'-') => 1,
        _ => 0,
    };
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Parse a pt-BR formatted amount such as `1.755,96`.
///
/// Every `.` is a thousands separator and the first `,` is the decimal mark.
/// The leading number wins over trailing text (`150 reais` is 150); a cell
/// without one, or with a non-finite value, counts as zero.
pub fn parse_localized_decimal(raw: &str) -> ParsedRevenue {
    let raw = raw.trim();
    if raw.is_empty() {
        return ParsedRevenue {
            value: 0.0,
            is_zero_or_empty: true,
        };
    }

    let normalized = raw.replace('.', "").replacen(',', ".", 1);
    let value = leading_number(&normalized)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);

    ParsedRevenue {
        value,
        is_zero_or_empty: value == 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_localized_decimal() {
        assert_eq!(parse_localized_decimal("1.755,96").value, 1755.96);
        assert_eq!(parse_localized_decimal("100,00").value, 100.0);
        assert_eq!(parse_localized_decimal("2.500").value, 2500.0);
        assert_eq!(parse_localized_decimal(" 42 ").value, 42.0);

        let empty = parse_localized_decimal("");
        assert_eq!(empty.value, 0.0);
        assert!(empty.is_zero_or_empty);

        let zero = parse_localized_decimal("0,00");
        assert_eq!(zero.value, 0.0);
        assert!(zero.is_zero_or_empty);

        assert!(!parse_localized_decimal("0,01").is_zero_or_empty);
    }

    #[test]
    fn test_trailing_text_after_amount_is_ignored() {
        assert_eq!(parse_localized_decimal("1,2,3").value, 1.2);
        assert_eq!(parse_localized_decimal("150 reais").value, 150.0);
        assert_eq!(parse_localized_decimal("10,00 BRL").value, 10.0);
        assert_eq!(parse_localized_decimal("-3,5x").value, -3.5);
        assert_eq!(parse_localized_decimal(",5").value, 0.5);
        assert_eq!(parse_localized_decimal("1e3 un").value, 1000.0);
        assert_eq!(parse_localized_decimal("7e").value, 7.0);
        assert!(!parse_localized_decimal("150 reais").is_zero_or_empty);
    }

    #[test]
    fn test_unparseable_revenue_is_zero() {
        for raw in ["abc", "R$ 10,00", "inf", "NaN", "-", ",", "1e999"] {
            let parsed = parse_localized_decimal(raw);
            assert_eq!(parsed.value, 0.0, "{}", raw);
            assert!(parsed.is_zero_or_empty, "{}", raw);
        }
    }

    #[test]
    fn test_parse_csv_trims_and_numbers_lines() {
        let text = "\u{feff}Vendedor , CNPJ,Fat\nDJALMA , 111 ,\n,,\n\nMARIA,222,\"1.000,00\"\n";
        let table = parse_csv(text).unwrap();

        assert_eq!(table.headers, vec!["Vendedor", "CNPJ", "Fat"]);
        assert!(table.has_header(" CNPJ "));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[0].cell("Vendedor"), "DJALMA");
        assert_eq!(table.rows[0].cell("CNPJ"), "111");
        assert_eq!(table.rows[0].cell("Fat"), "");
        assert_eq!(table.rows[1].line, 3);
        assert_eq!(table.rows[1].cell("Fat"), "1.000,00");
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let table = parse_csv("a,b,c\n1\n1,2,3,4\n").unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cell("c"), "");
        assert_eq!(table.rows[1].cell("c"), "3");
        assert_eq!(table.rows[0].cell("missing"), "");
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        let table = parse_csv("a,b\n").unwrap();
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_decode_upload() {
        assert_eq!(decode_upload(b"\xef\xbb\xbfa,b").unwrap(), "a,b");
        assert!(matches!(
            decode_upload(&[0x61, 0xff, 0x62]),
            Err(ImportError::InvalidEncoding(_))
        ));
    }
}
