// Integration tests for studysim
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use studysim::{
    explain_pair, read_matrix, run_abstracts, run_features, CacheUpdater, EmbeddingError,
    EmbeddingProvider, EmbeddingStore, PipelineConfig, RecordId, TaskType, Vector,
};
use studysim_embedding::UpdaterConfig;
use tempfile::TempDir;

const DATASET: &str = "\
ID,Main Author,Input Body Part,\
Interaction_PANEL_Hands-Free,\
Interaction_PANEL_Number of Selected Gestures,Abstract
1,Smith,\"Hand, Head\",Yes,4,Tapping the ear for input
2,Jones,\"Head, Face\",Partly,12,Head gestures sensed by earbuds
3,Lee,Ear,No,1,Jaw clenching as an input channel
4,Kim,,N/A,30,
";

#[derive(Default)]
struct KeywordProvider {
    calls: AtomicUsize,
}

impl EmbeddingProvider for KeywordProvider {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn embed(&self, text: &str, task: TaskType) -> Result<Vector, EmbeddingError> {
        assert_eq!(task, TaskType::Clustering);
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = text.to_lowercase();
        let features = ["ear", "head", "gesture", "input"]
            .iter()
            .map(|w| if text.contains(w) { 1.0 } else { 0.0 })
            .collect();
        Ok(Vector::new(features))
    }
}

fn setup(dir: &Path) -> PipelineConfig {
    std::fs::write(dir.join("data.csv"), DATASET).unwrap();
    let config_json = format!(
        r#"{{
            "dataset": "{dir}/data.csv",
            "embedding_store": "{dir}/abstract_embeddings.csv",
            "feature_matrix": "{dir}/out/feature.csv",
            "abstract_matrix": "{dir}/out/abstract.csv",
            "abstract_raw_matrix": "{dir}/out/abstract_raw.csv",
            "schema": {{
                "ordinal": ["Interaction_PANEL_Hands-Free"],
                "log_numeric": ["Interaction_PANEL_Number of Selected Gestures"],
                "multi_value": ["Input Body Part"],
                "excluded": ["Main Author"]
            }},
            "embedding": {{ "retry_base_ms": 1 }}
        }}"#,
        dir = dir.display()
    );
    let config_path = dir.join("pipeline.json");
    std::fs::write(&config_path, config_json).unwrap();
    PipelineConfig::load(Some(&config_path)).unwrap()
}

fn assert_standardized(matrix: &studysim::SimilarityMatrix) {
    assert!(matrix.is_symmetric());
    for i in 0..matrix.len() {
        assert_eq!(matrix.get(i, i), None);
    }
    let values: Vec<f64> = matrix.off_diagonal_values().collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    assert!(mean.abs() < 1e-9);
}

#[test]
fn test_feature_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());

    let result = run_features(&config).unwrap();
    assert_eq!(result.raw.len(), 4);
    assert!(result.raw.is_symmetric());
    for i in 0..4 {
        assert_eq!(result.raw.get(i, i), Some(1.0));
    }
    assert_standardized(&result.standardized);

    let persisted = read_matrix(&config.feature_matrix).unwrap();
    assert_eq!(persisted.ids(), result.standardized.ids());
    for i in 0..4 {
        for j in 0..4 {
            match (persisted.get(i, j), result.standardized.get(i, j)) {
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-12),
                (a, b) => assert_eq!(a, b),
            }
        }
    }
}

#[test]
fn test_explain_matches_matrix() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());

    let result = run_features(&config).unwrap();
    let explanation = explain_pair(&config, RecordId(1), RecordId(2)).unwrap();

    assert_eq!(
        result.raw.get_by_id(RecordId(1), RecordId(2)),
        Some(explanation.score)
    );
    let body_part = explanation
        .contributions
        .iter()
        .find(|c| c.column == "Input Body Part")
        .unwrap();
    assert!((body_part.contribution - 0.5).abs() < 1e-12);

    assert!(explain_pair(&config, RecordId(1), RecordId(99)).is_err());
}

#[tokio::test]
async fn test_abstract_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    let updater = CacheUpdater::new(KeywordProvider::default(), UpdaterConfig::default());

    // no store yet and no --init-store
    assert!(run_abstracts(&config, &updater, false).await.is_err());

    let outcome = run_abstracts(&config, &updater, true).await.unwrap();
    assert_eq!(
        outcome.report.embedded,
        vec![RecordId(1), RecordId(2), RecordId(3)]
    );
    assert_eq!(outcome.report.skipped, vec![RecordId(4)]);
    assert_eq!(updater.provider().calls.load(Ordering::SeqCst), 3);

    assert_eq!(outcome.similarity.raw.len(), 3);
    assert_standardized(&outcome.similarity.standardized);
    assert!(config.abstract_matrix.exists());
    assert!(config.abstract_raw_matrix.as_ref().unwrap().exists());

    let store =
        EmbeddingStore::open(&config.embedding_store, &config.embedding.embedding_column)
            .unwrap();
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn test_abstracts_require_abstract_column() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    std::fs::write(&config.dataset, "ID,Abstrct\n1,hello\n2,world\n").unwrap();
    let updater = CacheUpdater::new(KeywordProvider::default(), UpdaterConfig::default());

    let err = run_abstracts(&config, &updater, true).await.unwrap_err();
    assert!(format!("{err:#}").contains("Abstract"));
    assert_eq!(updater.provider().calls.load(Ordering::SeqCst), 0);
    assert!(!config.embedding_store.exists());
}

#[tokio::test]
async fn test_cache_idempotence() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    let updater = CacheUpdater::new(KeywordProvider::default(), UpdaterConfig::default());

    run_abstracts(&config, &updater, true).await.unwrap();
    let store_before = std::fs::read_to_string(&config.embedding_store).unwrap();

    let second = run_abstracts(&config, &updater, false).await.unwrap();
    assert!(second.report.embedded.is_empty());
    assert_eq!(updater.provider().calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        std::fs::read_to_string(&config.embedding_store).unwrap(),
        store_before
    );

    // a new record costs exactly one call
    let mut dataset = DATASET.to_string();
    dataset.push_str("5,Park,Ear,Yes,2,Ear gestures again\n");
    std::fs::write(&config.dataset, dataset).unwrap();

    let third = run_abstracts(&config, &updater, false).await.unwrap();
    assert_eq!(third.report.embedded, vec![RecordId(5)]);
    assert_eq!(updater.provider().calls.load(Ordering::SeqCst), 4);
    assert_eq!(third.similarity.raw.len(), 4);
}

#[test]
fn test_neighbors_on_persisted_matrix() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    run_features(&config).unwrap();

    let matrix = read_matrix(&config.feature_matrix).unwrap();
    let neighbors = matrix.neighbors(RecordId(1), 2, None).unwrap();
    assert_eq!(neighbors.len(), 2);
    assert!(neighbors[0].1 >= neighbors[1].1);
    assert!(neighbors.iter().all(|(id, _)| *id != RecordId(1)));
}
