//! Reference resolution: filling relational fields from the remote
//! directories and scaling the per-area requirements to the resolved plot

use anyhow::{bail, Context, Result};

use crate::api::LabStore;

use super::fields::DatasetKind;
use super::value::{Value, WorkingRecord};

/// Per-area requirement fields and their per-plot counterparts
const PLOT_SCALED: [(&str, &str); 3] = [
    ("lime_requirement", "lime_requirement_plot"),
    ("phosphorus_deficit", "phosphorus_deficit_plot"),
    ("potassium_deficit", "potassium_deficit_plot"),
];

/// Enrich a working record from the reference directories. An error here is
/// a resolution failure: the orchestrator records it and does not submit
/// the row.
pub async fn enrich<S: LabStore + ?Sized>(
    store: &S,
    dataset: DatasetKind,
    record: &mut WorkingRecord,
    producer_key: Option<&str>,
) -> Result<()> {
    match dataset {
        DatasetKind::Analysis => enrich_analysis(store, record).await,
        DatasetKind::Sample => {
            let key = producer_key.context("no producer key supplied for the sample dataset")?;
            enrich_sample(store, record, key).await
        }
    }
}

async fn enrich_analysis<S: LabStore + ?Sized>(
    store: &S,
    record: &mut WorkingRecord,
) -> Result<()> {
    let code = match record.text("code") {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => bail!("row has no business code"),
    };

    let reference = store
        .sample_by_code(&code)
        .await
        .with_context(|| format!("sample lookup failed for code '{}'", code))?;

    if let Some(plot_id) = reference.plot_id.clone() {
        record.set("plot_id", Value::Text(plot_id));
    }
    if let Some(settlement) = reference.settlement.clone() {
        record.set("settlement", Value::Text(settlement));
    }
    if let Some(city) = reference.city.clone() {
        record.set("city", Value::Text(city));
    }
    let owner = reference.owner_name();
    if !owner.is_empty() {
        record.set("owner_name", Value::Text(owner));
    }
    if let Some(identification) = reference.identification.clone() {
        record.set("identification", Value::Text(identification));
    }
    if let Some(property) = reference.property.clone() {
        record.set("property", Value::Text(property));
    }
    record.set_finite("area", reference.area);

    for (per_area, per_plot) in PLOT_SCALED {
        if let Some(value) = record.number(per_area) {
            record.set_finite(per_plot, value * reference.area);
        }
    }

    Ok(())
}

async fn enrich_sample<S: LabStore + ?Sized>(
    store: &S,
    record: &mut WorkingRecord,
    key: &str,
) -> Result<()> {
    let page = store
        .search_producers(key)
        .await
        .with_context(|| format!("producer search failed for key '{}'", key))?;

    let Some(producer) = page.items.first() else {
        bail!("producer not found for key '{}'", key);
    };

    if let Some(plot) = producer.plot.clone() {
        record.set("plot", Value::Text(plot));
    }
    let owner = producer.owner_name();
    if !owner.is_empty() {
        record.set("owner_name", Value::Text(owner));
    }
    if let Some(property) = producer.property.clone() {
        record.set("property", Value::Text(property));
    }
    if let Some(settlement) = producer.settlement.clone() {
        record.set("settlement", Value::Text(settlement));
    }
    record.set("is_deleted", Value::Int(producer.is_deleted));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{CreatedRecord, Page, ProducerReference, SampleReference};
    use anyhow::anyhow;
    use async_trait::async_trait;

    struct FakeStore {
        sample: Option<SampleReference>,
        producers: Vec<ProducerReference>,
    }

    #[async_trait]
    impl LabStore for FakeStore {
        async fn record_exists(&self, _: DatasetKind, _: &str) -> Result<bool> {
            Ok(false)
        }

        async fn sample_by_code(&self, code: &str) -> Result<SampleReference> {
            self.sample
                .clone()
                .ok_or_else(|| anyhow!("no sample for '{}'", code))
        }

        async fn search_producers(&self, _: &str) -> Result<Page<ProducerReference>> {
            Ok(Page { items: self.producers.clone(), total: self.producers.len() as u64 })
        }

        async fn submit_record(
            &self,
            _: DatasetKind,
            _: &serde_json::Value,
        ) -> Result<CreatedRecord> {
            Ok(CreatedRecord { id: 1 })
        }

        async fn submit_classification(&self, _: &serde_json::Value) -> Result<CreatedRecord> {
            Ok(CreatedRecord { id: 1 })
        }
    }

    fn sample_reference() -> SampleReference {
        SampleReference {
            id: 42,
            plot_id: Some("P-9".into()),
            settlement: Some("Vale Verde".into()),
            city: Some("Sorriso".into()),
            first_name: "Ana".into(),
            last_name: "Souza".into(),
            identification: Some("123.456".into()),
            property: Some("Fazenda Norte".into()),
            area: 2.5,
        }
    }

    #[tokio::test]
    async fn test_analysis_enrichment_merges_and_scales() {
        let store = FakeStore { sample: Some(sample_reference()), producers: vec![] };

        let mut record = WorkingRecord::new();
        record.set("code", Value::Text("A-1".into()));
        record.set("lime_requirement", Value::Number(1.2));
        record.set("phosphorus_deficit", Value::Number(10.0));

        enrich(&store, DatasetKind::Analysis, &mut record, None)
            .await
            .unwrap();

        assert_eq!(record.text("plot_id"), Some("P-9"));
        assert_eq!(record.text("owner_name"), Some("Ana Souza"));
        assert_eq!(record.number("area"), Some(2.5));
        assert_eq!(record.number("lime_requirement_plot"), Some(3.0));
        assert_eq!(record.number("phosphorus_deficit_plot"), Some(25.0));
        // potassium_deficit was never set, so its plot variant stays unset
        assert!(!record.contains("potassium_deficit_plot"));
    }

    #[tokio::test]
    async fn test_analysis_lookup_failure_is_an_error() {
        let store = FakeStore { sample: None, producers: vec![] };
        let mut record = WorkingRecord::new();
        record.set("code", Value::Text("A-2".into()));

        let err = enrich(&store, DatasetKind::Analysis, &mut record, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("A-2"));
    }

    #[tokio::test]
    async fn test_sample_path_requires_producer_match() {
        let store = FakeStore { sample: None, producers: vec![] };
        let mut record = WorkingRecord::new();

        let err = enrich(&store, DatasetKind::Sample, &mut record, Some("silva"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("producer not found"));
    }

    #[tokio::test]
    async fn test_sample_path_uses_first_match() {
        let producers = vec![
            ProducerReference {
                id: 1,
                plot: Some("Lote 4".into()),
                first_name: "Joao".into(),
                last_name: "Silva".into(),
                property: Some("Chacara Sul".into()),
                settlement: Some("Nova Uniao".into()),
                is_deleted: 0,
            },
            ProducerReference {
                id: 2,
                plot: Some("Lote 9".into()),
                first_name: "Other".into(),
                last_name: "Match".into(),
                property: None,
                settlement: None,
                is_deleted: 1,
            },
        ];
        let store = FakeStore { sample: None, producers };
        let mut record = WorkingRecord::new();

        enrich(&store, DatasetKind::Sample, &mut record, Some("silva"))
            .await
            .unwrap();

        assert_eq!(record.text("plot"), Some("Lote 4"));
        assert_eq!(record.text("owner_name"), Some("Joao Silva"));
        assert_eq!(record.get("is_deleted"), Some(&Value::Int(0)));
    }
}
