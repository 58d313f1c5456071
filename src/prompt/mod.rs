//! Prompt rendering: a specification plus a mode become one instruction
//! string for the model. Pure string construction, no validation of the
//! specification content.

mod templates;

use std::fmt::Write as _;

use clap::ValueEnum;

use crate::error::TemplateError;
use crate::pipeline::FileManifestEntry;

/// What kind of project one generation call produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GenerationMode {
    /// A backend service (single-shot for monolith, planned multi-file for
    /// microservices).
    Backend,
    /// A frontend application.
    Frontend,
    /// Glue artifacts wiring an existing frontend and backend together.
    Integration,
    /// A file manifest only, no code generation.
    Planning,
}

/// Backend architecture selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Architecture {
    /// One service, generated in a single response.
    Monolith,
    /// Multiple services, planned first and generated file by file.
    Microservices,
}

impl Architecture {
    /// Label substituted into planning templates.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Architecture::Monolith => "monolith",
            Architecture::Microservices => "microservices",
        }
    }
}

/// Direction of a source-conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConversionDirection {
    /// Derive a backend from frontend source.
    FrontendToBackend,
    /// Derive a frontend from backend source.
    BackendToFrontend,
}

/// Renders the top-level prompt for a generation mode.
///
/// # Errors
///
/// Fails with [`TemplateError::MissingParameter`] when the selected template
/// requires a parameter the caller did not supply.
pub fn render_generation(
    mode: GenerationMode,
    architecture: Architecture,
    specification: &str,
) -> Result<String, TemplateError> {
    match (mode, architecture) {
        (GenerationMode::Backend, Architecture::Monolith) => {
            fill(templates::BACKEND_MONOLITH, &[("spec", specification)])
        }
        (GenerationMode::Backend | GenerationMode::Planning, Architecture::Microservices)
        | (GenerationMode::Planning, Architecture::Monolith) => fill(
            templates::MICROSERVICES_PLAN,
            &[("spec", specification), ("architecture", architecture.label())],
        ),
        (GenerationMode::Frontend, _) => fill(templates::FRONTEND, &[("spec", specification)]),
        (GenerationMode::Integration, _) => {
            fill(templates::INTEGRATION, &[("spec", specification)])
        }
    }
}

/// Renders the narrower prompt scoped to one manifest entry.
///
/// # Errors
///
/// Fails with [`TemplateError::MissingParameter`] if the per-file template
/// gains a placeholder no parameter covers.
pub fn render_per_file(
    specification: &str,
    entry: &FileManifestEntry,
    manifest: &[FileManifestEntry],
) -> Result<String, TemplateError> {
    let listing = manifest_listing(manifest);
    fill(
        templates::PER_FILE,
        &[
            ("path", &entry.path),
            ("description", &entry.description),
            ("manifest", &listing),
            ("spec", specification),
        ],
    )
}

/// Renders the planning prompt for a conversion job, embedding the
/// counterpart source.
///
/// # Errors
///
/// Fails with [`TemplateError::MissingParameter`] when `source` is `None`;
/// conversion templates require the counterpart source.
pub fn render_conversion_plan(
    direction: ConversionDirection,
    specification: &str,
    source: Option<&str>,
) -> Result<String, TemplateError> {
    let template = match direction {
        ConversionDirection::FrontendToBackend => templates::FRONTEND_TO_BACKEND_PLAN,
        ConversionDirection::BackendToFrontend => templates::BACKEND_TO_FRONTEND_PLAN,
    };
    let mut params = vec![("spec", specification)];
    if let Some(source) = source {
        params.push(("source", source));
    }
    fill(template, &params)
}

/// One line per manifest entry, for per-file prompt context.
fn manifest_listing(manifest: &[FileManifestEntry]) -> String {
    let mut listing = String::new();
    for entry in manifest {
        let _ = writeln!(listing, "- {} — {}", entry.path, entry.description);
    }
    listing
}

/// Substitutes `<<name>>` placeholders from `params`.
///
/// The template is scanned left to right, so placeholder-like text inside a
/// substituted value (user source code, say) is never re-interpreted.
fn fill(template: &str, params: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("<<") {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find(">>") else {
            // A lone `<<` with no closer is literal text, not a placeholder.
            rendered.push_str(&rest[start..]);
            return Ok(rendered);
        };
        let name = &after[..end];
        match params.iter().find(|(param, _)| *param == name) {
            Some((_, value)) => rendered.push_str(value),
            None => return Err(TemplateError::MissingParameter(name.to_string())),
        }
        rest = &after[end + 2..];
    }

    rendered.push_str(rest);
    Ok(rendered)
}
