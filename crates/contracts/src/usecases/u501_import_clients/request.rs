use serde::{Deserialize, Serialize};

/// Semantic import field → header name in the uploaded file.
///
/// Wire keys are the ones the upload form sends (`nome_vendedor`, `cnpj`, ...);
/// the English field names are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(rename = "nome_vendedor", alias = "salesperson")]
    pub salesperson: String,
    #[serde(rename = "razao_social", alias = "legal_name")]
    pub legal_name: String,
    #[serde(rename = "cnpj", alias = "tax_id")]
    pub tax_id: String,
    #[serde(rename = "faturamento", alias = "revenue")]
    pub revenue: String,
    #[serde(rename = "municipio", alias = "municipality")]
    pub municipality: String,
    #[serde(rename = "situacao_credito", alias = "credit_status")]
    pub credit_status: String,
    #[serde(rename = "comparativo", alias = "comparison_flag")]
    pub comparison_flag: String,
}

impl ColumnMapping {
    /// (wire key, mapped header) for every field, in form order
    pub fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("nome_vendedor", self.salesperson.as_str()),
            ("razao_social", self.legal_name.as_str()),
            ("cnpj", self.tax_id.as_str()),
            ("faturamento", self.revenue.as_str()),
            ("municipio", self.municipality.as_str()),
            ("situacao_credito", self.credit_status.as_str()),
            ("comparativo", self.comparison_flag.as_str()),
        ]
    }

    /// Every field must name a header.
    pub fn validate(&self) -> Result<(), String> {
        let unmapped: Vec<&str> = self
            .entries()
            .iter()
            .filter(|(_, header)| header.trim().is_empty())
            .map(|(key, _)| *key)
            .collect();
        if unmapped.is_empty() {
            Ok(())
        } else {
            Err(format!("Unmapped fields: {}", unmapped.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_form_keys() {
        let json = r#"{
            "nome_vendedor": "Vendedor",
            "razao_social": "Razão Social",
            "cnpj": "CNPJ",
            "faturamento": "Fat. Período",
            "municipio": "Cidade",
            "situacao_credito": "Sit. Crédito",
            "comparativo": "Comparativo"
        }"#;
        let mapping: ColumnMapping = serde_json::from_str(json).unwrap();
        assert_eq!(mapping.salesperson, "Vendedor");
        assert_eq!(mapping.revenue, "Fat. Período");
        assert!(mapping.validate().is_ok());
    }

    #[test]
    fn test_deserialize_english_aliases() {
        let json = r#"{
            "salesperson": "a", "legal_name": "b", "tax_id": "c", "revenue": "d",
            "municipality": "e", "credit_status": "f", "comparison_flag": "g"
        }"#;
        let mapping: ColumnMapping = serde_json::from_str(json).unwrap();
        assert_eq!(mapping.comparison_flag, "g");
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let json = r#"{"nome_vendedor": "Vendedor", "cnpj": "CNPJ"}"#;
        assert!(serde_json::from_str::<ColumnMapping>(json).is_err());
    }

    #[test]
    fn test_validate_lists_blank_fields() {
        let json = r#"{
            "nome_vendedor": "Vendedor", "razao_social": "", "cnpj": "CNPJ",
            "faturamento": "Fat", "municipio": " ", "situacao_credito": "Sit",
            "comparativo": "Comp"
        }"#;
        let mapping: ColumnMapping = serde_json::from_str(json).unwrap();
        let err = mapping.validate().unwrap_err();
        assert_eq!(err, "Unmapped fields: razao_social, municipio");
    }
}
