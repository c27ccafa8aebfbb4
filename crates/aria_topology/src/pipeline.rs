//! End-to-end pass for one root locator.
//!
//! compose → validate → build registry → normalize, strictly in sequence.
//! Fatal errors abort with `Err`; collected issues travel in the output.
//! Registry and topology are only built when validation found no errors.

use crate::model::Topology;
use crate::normalizer::{NormalizeConfig, Normalizer};
use crate::plan::Plan;
use aria_core::{CoreResult, IssueList, Locator, RawDocument};
use aria_loader::{ComposeConfig, Decoder, ImportComposer, Loader};
use aria_presentation::{Grammar, GrammarTable, Presentation, ValidateConfig, Validator};
use aria_types::TypeRegistry;
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Settings for every stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Import composition
    pub compose: ComposeConfig,
    /// Validation
    pub validate: ValidateConfig,
    /// Normalization
    pub normalize: NormalizeConfig,
}

impl PipelineConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set composition settings
    #[must_use]
    pub fn with_compose(mut self, compose: ComposeConfig) -> Self {
        self.compose = compose;
        self
    }

    /// Set validation settings
    #[must_use]
    pub fn with_validate(mut self, validate: ValidateConfig) -> Self {
        self.validate = validate;
        self
    }

    /// Set normalization settings
    #[must_use]
    pub fn with_normalize(mut self, normalize: NormalizeConfig) -> Self {
        self.normalize = normalize;
        self
    }
}

/// Everything one pass produced
#[derive(Debug)]
pub struct PipelineOutput {
    /// Composed document
    pub document: RawDocument,
    /// Grammar the document was read with
    pub grammar: Grammar,
    /// Collected issues, in discovery order
    pub issues: IssueList,
    /// Frozen registry, when validation passed
    pub registry: Option<TypeRegistry>,
    /// Normalized topology, when validation passed
    pub topology: Option<Topology>,
}

impl PipelineOutput {
    /// Check if no error-severity issue was collected
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.issues.has_errors()
    }

    /// Deployment plan, only for a clean topology
    #[must_use]
    pub fn plan(&self) -> Option<Plan> {
        if !self.is_clean() {
            return None;
        }
        self.topology.as_ref().map(Plan::build)
    }

    /// Typed view of the composed document
    #[must_use]
    pub fn view(&self) -> Presentation<'_> {
        Presentation::root(&self.document, self.grammar.root)
    }
}

/// Runs every stage for a root locator
pub struct Pipeline {
    composer: ImportComposer,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline over a loader/decoder pair with the standard grammars
    #[must_use]
    pub fn new(loader: impl Loader + 'static, decoder: impl Decoder + 'static) -> Self {
        Self {
            composer: ImportComposer::new(loader, decoder),
            config: PipelineConfig::default(),
        }
    }

    /// Use a different grammar table
    #[must_use]
    pub fn with_grammars(mut self, grammars: GrammarTable) -> Self {
        self.composer = self.composer.with_grammars(grammars);
        self
    }

    /// Set the configuration
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.composer = self.composer.with_config(config.compose.clone());
        self.config = config;
        self
    }

    /// Abort composition once `flag` is set
    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.composer = self.composer.with_cancellation(flag);
        self
    }

    /// Grammar table in use
    #[must_use]
    pub fn grammars(&self) -> &GrammarTable {
        self.composer.grammars()
    }

    /// Compose only
    ///
    /// # Errors
    ///
    /// Returns the composer's fatal errors
    pub fn compose(&self, locator: &Locator) -> CoreResult<RawDocument> {
        self.composer.compose(locator)
    }

    /// Run every stage
    ///
    /// # Errors
    ///
    /// Returns a fatal error: grammar not found, import failure, dangling
    /// parent or duplicate type
    pub fn run(&self, locator: &Locator) -> CoreResult<PipelineOutput> {
        let document = self.composer.compose(locator)?;
        let grammar = *self.composer.grammars().select(&document.root, &document.locator)?;
        let mut issues = IssueList::new();

        let (registry, topology) = {
            let view = Presentation::root(&document, grammar.root);
            Validator::new(self.config.validate.clone()).validate(&view, &mut issues);
            if issues.has_errors() {
                tracing::warn!(
                    locator = %locator,
                    errors = issues.errors().count(),
                    "validation failed, skipping normalization"
                );
                (None, None)
            } else {
                let registry = TypeRegistry::build(&view, &grammar)?;
                let topology = Normalizer::new(&registry, self.config.normalize.clone())
                    .normalize(&view, &grammar, &mut issues)?;
                (Some(registry), Some(topology))
            }
        };

        tracing::info!(
            locator = %locator,
            grammar = grammar.version,
            issues = issues.len(),
            "pipeline finished"
        );
        Ok(PipelineOutput {
            document,
            grammar,
            issues,
            registry,
            topology,
        })
    }
}
