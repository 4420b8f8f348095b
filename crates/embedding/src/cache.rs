use once_cell::sync::OnceCell;
use onnxruntime::{environment::Environment, session::Session};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tokenizers::Tokenizer;

use crate::assets::ModelAssets;
use crate::EmbeddingError;

// One ONNX environment per process; encoders are cached per thread so
// concurrent requests never contend on a session.
static ORT_ENV: OnceCell<Environment> = OnceCell::new();

thread_local! {
    static ENCODER_CACHE: RefCell<std::collections::HashMap<EncoderCacheKey, Rc<CachedEncoder>>> =
        RefCell::new(std::collections::HashMap::new());
}

#[derive(Hash, PartialEq, Eq, Clone)]
struct EncoderCacheKey {
    model_path: PathBuf,
    tokenizer_path: PathBuf,
}

pub(crate) struct CachedEncoder {
    pub(crate) tokenizer: Tokenizer,
    pub(crate) session: RefCell<Session<'static>>,
}

impl CachedEncoder {
    pub(crate) fn load(assets: &ModelAssets) -> Result<Self, EmbeddingError> {
        let tokenizer = Tokenizer::from_file(&assets.tokenizer_path)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

        let env = ort_environment()?;
        let session = env
            .new_session_builder()
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?
            .with_model_from_file(assets.model_path.clone())
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

        Ok(Self {
            tokenizer,
            session: RefCell::new(session),
        })
    }
}

pub(crate) fn get_or_load_encoder(
    assets: &ModelAssets,
) -> Result<Rc<CachedEncoder>, EmbeddingError> {
    let key = EncoderCacheKey {
        model_path: assets.model_path.clone(),
        tokenizer_path: assets.tokenizer_path.clone(),
    };

    ENCODER_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(handle) = cache.get(&key) {
            return Ok(handle.clone());
        }

        let handle = Rc::new(CachedEncoder::load(assets)?);
        cache.insert(key, handle.clone());
        Ok(handle)
    })
}

fn ort_environment() -> Result<&'static Environment, EmbeddingError> {
    ORT_ENV.get_or_try_init(|| {
        Environment::builder()
            .with_name("finsight-embedding")
            .build()
            .map_err(|e| EmbeddingError::Inference(e.to_string()))
    })
}
