//! Local first-aid knowledge base
//!
//! Owns the snippet corpus and the index built over it. The index is built
//! once at startup and shared read-only with every retriever.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::embeddings::EmbeddingService;
use crate::embeddings::TextEmbedder;
use crate::errors::FirstAidError;
use crate::errors::Result;
use crate::index::LocalIndex;

/// Built-in first-aid snippets (diabetes, cardiac, renal emergencies)
pub const MEDICAL_SNIPPETS: &[&str] = &[
    // Diabetes
    "Hypoglycaemia is defined as blood glucose < 70 mg/dL and needs rapid glucose intake.",
    "First-aid for mild hypoglycaemia: give 15 g of fast-acting carbohydrate such as glucose tablets, juice or regular soda, then recheck blood glucose after 15 minutes.",
    "If blood glucose is still below 70 mg/dL after 15 minutes, repeat 15 g of fast-acting carbohydrate and recheck.",
    "For severe hypoglycaemia with unconsciousness, give intramuscular glucagon 1 mg if available and call emergency services.",
    "Never give food or drink by mouth to an unconscious person; place them in the recovery position.",
    "Symptoms of hypoglycaemia include sweating, shakiness, confusion, palpitations and hunger.",
    "A fasting plasma glucose ≥ 126 mg/dL on two occasions confirms diabetes.",
    "Gestational diabetes is managed with diet, glucose monitoring and, when targets are not met, insulin; fasting glucose should stay below 95 mg/dL in pregnancy.",
    "Diabetic ketoacidosis presents with high glucose, ketones in urine or blood, vomiting, abdominal pain and deep rapid breathing; it needs emergency care.",
    "Hyperosmolar hyperglycaemic state causes extreme thirst, very high glucose (often above 600 mg/dL), dehydration and confusion, usually with little or no ketones.",
    "A glucose meter reading of 'HI' means glucose is above the meter range; seek urgent medical care and drink water if able to swallow.",
    // Cardiac
    "Sudden chest pain radiating to the left arm may indicate myocardial infarction.",
    "For suspected heart attack, call emergency services immediately, keep the person at rest and give 300 mg aspirin to chew if not allergic.",
    "Do not delay calling an ambulance to take aspirin; emergency services come first in suspected myocardial infarction.",
    "For angina, take one nitroglycerin tablet under the tongue; if pain persists after 5 minutes, call emergency services and take a second dose.",
    "Do not take more than three nitroglycerin doses in 15 minutes; stop if blood pressure drops or you feel faint.",
    "Nitroglycerin must not be used within 24-48 hours of phosphodiesterase inhibitors such as sildenafil.",
    "In acute heart failure with shortness of breath, sit the person upright with legs down and call emergency services.",
    "Ankle swelling (oedema) with breathlessness in heart failure suggests fluid overload and needs prompt medical review.",
    "If a person is unresponsive and not breathing normally, start CPR with 30 chest compressions to 2 rescue breaths and use an AED as soon as available.",
    // Renal
    "Acute kidney injury is suggested by a creatinine rise of ≥ 0.3 mg/dL within 48 hours or reduced urine output.",
    "In suspected acute kidney injury from dehydration, rehydrate with oral fluids if able to drink and seek medical assessment.",
    "NSAIDs such as ibuprofen can cause acute kidney injury; stop taking them if kidney damage is suspected.",
    "Flank pain with reduced urine after NSAID use needs medical evaluation of kidney function.",
    "Hyperkalaemia (potassium > 6.0 mmol/L) is a medical emergency because it can cause dangerous heart rhythms.",
    "Emergency treatment of hyperkalaemia includes intravenous calcium gluconate to stabilize heart rhythm and insulin–glucose infusion to shift potassium into cells.",
    "Patients with chronic kidney disease and high potassium should avoid potassium-rich foods and potassium supplements until reviewed.",
    "Signs of fluid overload in kidney failure include swelling, breathlessness and rapid weight gain.",
];

/// Read a replacement corpus from a JSON array of strings
pub fn load_snippets_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let snippets: Vec<String> = serde_json::from_str(&content)?;
    Ok(snippets
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// The built-in corpus, or the file at `path` when one is configured
pub fn load_snippets(path: Option<&Path>) -> Result<Vec<String>> {
    match path {
        Some(path) => load_snippets_from_file(path),
        None => Ok(MEDICAL_SNIPPETS.iter().map(|s| (*s).to_string()).collect()),
    }
}

/// Snippet corpus plus the index built from its embeddings
pub struct CorpusManager {
    index: Arc<LocalIndex>,
    embedder: Arc<dyn TextEmbedder>,
}

impl CorpusManager {
    /// Embed every snippet in one batch and build the index
    ///
    /// # Errors
    /// - `Configuration` for an empty corpus or inconsistent embeddings
    /// - Embedding provider errors; the corpus cannot be built without them
    pub async fn build(snippets: Vec<String>, embedder: Arc<dyn TextEmbedder>) -> Result<Self> {
        if snippets.is_empty() {
            return Err(FirstAidError::Configuration(
                "Snippet corpus is empty".to_string(),
            ));
        }

        info!("Building local index for {} snippets...", snippets.len());
        let embeddings = embedder.embed_batch(&snippets).await?;
        let index = LocalIndex::from_embeddings(snippets, embeddings)?;
        info!("Local index built successfully");

        Ok(Self {
            index: Arc::new(index),
            embedder,
        })
    }

    /// Load the configured corpus and embed it with the configured provider
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let snippets = load_snippets(config.retrieval.corpus_path.as_deref())?;
        let embedder = Arc::new(EmbeddingService::new(config)?);
        Self::build(snippets, embedder).await
    }

    /// Wrap an index that was built elsewhere
    pub fn from_parts(index: Arc<LocalIndex>, embedder: Arc<dyn TextEmbedder>) -> Self {
        Self { index, embedder }
    }

    pub fn index(&self) -> &Arc<LocalIndex> {
        &self.index
    }

    pub fn embedder(&self) -> &Arc<dyn TextEmbedder> {
        &self.embedder
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
