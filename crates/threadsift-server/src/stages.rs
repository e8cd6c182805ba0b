//! Pipeline stage dispatch, shared by the CLI and the streaming routes.
//!
//! The clean and sentiment stages live in their own crate; the index and
//! evaluate stages are orchestrated here because they span the pipeline,
//! embedding, index, and chat crates.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use threadsift_chat::{
    AnswerComposer, ChatMessage, ContextPassage, LLMConfig, LlmRelevanceScorer, RelevanceScorer,
};
use threadsift_core::{AppConfig, Error, Result};
use threadsift_index::{NewEntry, VectorIndex};
use threadsift_pipeline::records::{self, SentimentRecord};
use threadsift_pipeline::{OverlapChunker, SentimentAnalyzer, Taxonomy};
use threadsift_retrieve::{CategoryRouter, FilteredRetriever, RetrieveError};

/// Stage names accepted by the CLI and the streaming endpoint.
pub const STAGES: &[&str] = &["collect", "clean", "sentiment", "index", "evaluate"];

/// Stages chained by the full-pipeline run; evaluation is excluded.
pub const FULL_RUN_STAGES: &[&str] = &["collect", "clean", "sentiment", "index"];

pub fn is_stage(name: &str) -> bool {
    STAGES.contains(&name)
}

/// Run one named stage to completion.
pub async fn run_stage(name: &str, config: &AppConfig) -> Result<()> {
    match name {
        "collect" => {
            let client = threadsift_collect::RedditClient::new(reqwest::Client::new());
            threadsift_collect::run(
                &config.data_paths,
                &client,
                &threadsift_collect::CollectConfig::default(),
            )
            .await?;
            Ok(())
        }
        "clean" => {
            let taxonomy = Taxonomy::load_or_default(&config.data_paths.taxonomy_file)?;
            threadsift_pipeline::clean_stage::run(&config.data_paths, &taxonomy)?;
            Ok(())
        }
        "sentiment" => {
            let analyzer =
                SentimentAnalyzer::new(config.positive_threshold, config.negative_threshold);
            threadsift_pipeline::sentiment_stage::run(&config.data_paths, &analyzer)?;
            Ok(())
        }
        "index" => run_index_stage(config),
        "evaluate" => run_evaluate_stage(config).await,
        other => Err(Error::Config(format!("unknown stage: {}", other))),
    }
}

// ---------------------------------------------------------------
// Index stage
// ---------------------------------------------------------------

/// Rebuild the vector index from the sentiment dataset.
fn run_index_stage(config: &AppConfig) -> Result<()> {
    let paths = &config.data_paths;
    if !paths.sentiment_csv.exists() {
        return Err(Error::NotFound(format!(
            "sentiment dataset {} (run the sentiment step first)",
            paths.sentiment_csv.display()
        )));
    }

    let embedder = threadsift_embed::create_embedder(&paths.model_dir);
    if !embedder.is_available() {
        return Err(Error::Inference(
            "no embedding backend available; place model.onnx and tokenizer.json under the \
             models directory and build with the onnx feature"
                .into(),
        ));
    }

    info!("Loading sentiment dataset from {}", paths.sentiment_csv.display());
    let rows: Vec<SentimentRecord> = records::load_csv(&paths.sentiment_csv)?;
    info!("Loaded {} rows", rows.len());

    let index = VectorIndex::open(&paths.index_dir, config.embedding_dim)?;
    index.clear()?;

    let chunker = OverlapChunker::new(config.chunk_size, config.chunk_overlap);
    let mut entries = 0usize;
    let mut skipped = 0usize;

    for row in &rows {
        let text = row.clean_text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("nan") {
            skipped += 1;
            continue;
        }

        let keywords = row.keywords().join(", ");
        for chunk in chunker.chunk(text) {
            let Some(result) = embedder.embed(&chunk.text) else {
                warn!("Embedding failed for a chunk of record {}", row.id);
                continue;
            };

            let key = index.add_entry(&NewEntry {
                record_id: row.id.clone(),
                category: row.category,
                subreddit: row.subreddit.clone(),
                keywords: keywords.clone(),
                sentiment: row.sentiment.clone(),
                text: chunk.text.clone(),
            })?;
            index.add_embedding(&key, &result.embedding)?;
            entries += 1;
        }
    }

    info!(
        "Indexed {} chunks from {} rows ({} rows skipped as empty)",
        entries,
        rows.len(),
        skipped
    );
    Ok(())
}

// ---------------------------------------------------------------
// Evaluate stage
// ---------------------------------------------------------------

/// One row of the evaluation output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRow {
    pub question: String,
    pub rag_answer: String,
    pub llm_only_answer: String,
    pub rag_relevance: f64,
    pub llm_relevance: f64,
}

const DEFAULT_EVAL_QUESTIONS: &[&str] = &[
    "What do construction workers think of Procore?",
    "Which legal case management software do lawyers prefer?",
    "What do sysadmins complain about with Jira?",
    "Is Bluebeam worth the cost for smaller construction firms?",
    "What security software issues come up in tech discussions?",
];

/// Answer each evaluation question with and without retrieval, score both
/// answers for relevance, and write the results file.
async fn run_evaluate_stage(config: &AppConfig) -> Result<()> {
    let paths = &config.data_paths;

    let questions = load_questions(paths)?;
    info!("Evaluating {} questions", questions.len());

    let llm = LLMConfig::load(&paths.llm_config_file);
    let (provider, model, api_key) = llm.resolve_provider().ok_or_else(|| {
        Error::Config("no LLM provider configured; set an API key first".into())
    })?;

    let index = VectorIndex::open(&paths.index_dir, config.embedding_dim)?;
    let embedder = threadsift_embed::create_embedder(&paths.model_dir);
    let router = CategoryRouter::default();
    let retriever = FilteredRetriever::new(&index, embedder.as_ref(), config.top_k);
    let composer = AnswerComposer::default();
    let client = reqwest::Client::new();

    let scorer = LlmRelevanceScorer {
        client: client.clone(),
        provider,
        model: model.clone(),
        api_key: api_key.clone(),
    };

    let mut results = Vec::with_capacity(questions.len());
    for question in &questions {
        info!("Evaluating: {}", question);

        let rag_answer = answer_with_rag(
            &client,
            &retriever,
            &router,
            &composer,
            (provider, model.as_str(), api_key.as_str()),
            question,
        )
        .await;

        let llm_only_answer = answer_without_rag(
            &client,
            (provider, model.as_str(), api_key.as_str()),
            question,
        )
        .await;

        let rag_relevance = score_or_zero(&scorer, question, &rag_answer).await;
        let llm_relevance = score_or_zero(&scorer, question, &llm_only_answer).await;

        results.push(EvaluationRow {
            question: question.clone(),
            rag_answer,
            llm_only_answer,
            rag_relevance,
            llm_relevance,
        });
    }

    let mut writer = csv::Writer::from_path(&paths.evaluation_csv)?;
    for row in &results {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(
        "Wrote {} evaluation rows to {}",
        results.len(),
        paths.evaluation_csv.display()
    );
    Ok(())
}

fn load_questions(paths: &threadsift_core::DataPaths) -> Result<Vec<String>> {
    if paths.evaluation_questions.exists() {
        let data = std::fs::read_to_string(&paths.evaluation_questions)?;
        let questions: Vec<String> = data
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        if !questions.is_empty() {
            return Ok(questions);
        }
    }
    Ok(DEFAULT_EVAL_QUESTIONS.iter().map(|q| q.to_string()).collect())
}

/// Router → retriever → composer, with failures rendered as answer text the
/// same way the chat endpoint reports them.
async fn answer_with_rag(
    client: &reqwest::Client,
    retriever: &FilteredRetriever<'_>,
    router: &CategoryRouter,
    composer: &AnswerComposer,
    llm: (threadsift_chat::LLMProvider, &str, &str),
    question: &str,
) -> String {
    let filter = router.route(question);
    let hits = match retriever.retrieve(question, filter) {
        Ok(hits) => hits,
        Err(RetrieveError::IndexUnavailable) => {
            return crate::routes::chat::INDEX_MISSING_MESSAGE.to_string()
        }
        Err(e) => return format!("Error during retrieval: {}", e),
    };

    let passages: Vec<ContextPassage> = hits
        .iter()
        .map(|hit| ContextPassage {
            text: hit.text.clone(),
            subreddit: hit.subreddit.clone(),
            category: hit.category.to_string(),
        })
        .collect();

    match composer.compose(client, Some(llm), question, &passages).await {
        Ok(answer) => answer.text,
        Err(e) => format!("Error during generation: {}", e),
    }
}

async fn answer_without_rag(
    client: &reqwest::Client,
    llm: (threadsift_chat::LLMProvider, &str, &str),
    question: &str,
) -> String {
    let (provider, model, api_key) = llm;
    let messages = vec![
        ChatMessage {
            role: "system".into(),
            content: "You are a helpful assistant answering questions about software tools \
                      used in the Law, Construction, and Tech industries."
                .into(),
        },
        ChatMessage {
            role: "user".into(),
            content: question.to_string(),
        },
    ];

    threadsift_chat::providers::complete(client, provider, &messages, model, api_key, 0.2, 400)
        .await
        .unwrap_or_else(|e| format!("Error during generation: {}", e))
}

async fn score_or_zero(scorer: &LlmRelevanceScorer, question: &str, answer: &str) -> f64 {
    match scorer.score(question, answer).await {
        Ok(score) => score,
        Err(e) => {
            warn!("Relevance scoring failed: {}", e);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        for name in ["collect", "clean", "sentiment", "index", "evaluate"] {
            assert!(is_stage(name));
        }
        assert!(!is_stage("full"));
        assert!(!is_stage("deploy"));
    }

    #[test]
    fn test_full_run_excludes_evaluate() {
        assert!(!FULL_RUN_STAGES.contains(&"evaluate"));
        assert!(FULL_RUN_STAGES.iter().all(|s| is_stage(s)));
    }

    #[test]
    fn test_index_stage_requires_sentiment_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_env(dir.path()).unwrap();
        let result = run_index_stage(&config);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_default_questions_used_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_env(dir.path()).unwrap();
        let questions = load_questions(&config.data_paths).unwrap();
        assert_eq!(questions.len(), DEFAULT_EVAL_QUESTIONS.len());
    }

    #[test]
    fn test_questions_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_env(dir.path()).unwrap();
        std::fs::write(
            &config.data_paths.evaluation_questions,
            "Is Revit better than AutoCAD?\n\n  What about Westlaw?  \n",
        )
        .unwrap();

        let questions = load_questions(&config.data_paths).unwrap();
        assert_eq!(
            questions,
            vec![
                "Is Revit better than AutoCAD?".to_string(),
                "What about Westlaw?".to_string()
            ]
        );
    }
}
