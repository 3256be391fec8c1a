//! Keyword-driven layouts. Used when no model provider is wanted, and as a
//! fixed reference for how each layout looks.

use super::Generator;
use crate::error::GenerationResult;
use async_trait::async_trait;
use inkwell_sketch::ImageBlob;
use inkwell_ui::{GeneratedOutput, GeneratedUiSchema, UiElement};
use regex::Regex;
use std::sync::OnceLock;

static FORM_RE: OnceLock<Regex> = OnceLock::new();
static CARDS_RE: OnceLock<Regex> = OnceLock::new();
static EMPHASIS_RE: OnceLock<Regex> = OnceLock::new();

fn wants_form(prompt: &str) -> bool {
    FORM_RE
        .get_or_init(|| Regex::new(r"(?i)form|input|field").expect("valid regex"))
        .is_match(prompt)
}

fn wants_cards(prompt: &str) -> bool {
    CARDS_RE
        .get_or_init(|| Regex::new(r"(?i)card|list|items?").expect("valid regex"))
        .is_match(prompt)
}

fn wants_emphasis(prompt: &str) -> bool {
    EMPHASIS_RE
        .get_or_init(|| Regex::new(r"(?i)highlight|emphasize|bigger|bold").expect("valid regex"))
        .is_match(prompt)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleGenerator;

impl RuleGenerator {
    pub fn layout_for(prompt: &str) -> GeneratedUiSchema {
        let root = if wants_form(prompt) {
            UiElement::container(
                "mx-auto max-w-xl flex flex-col gap-4",
                vec![
                    UiElement::text("text-2xl font-semibold", "Generated Form"),
                    UiElement::input("Name"),
                    UiElement::input("Email"),
                    UiElement::button("Submit"),
                ],
            )
        } else if wants_cards(prompt) {
            UiElement::container(
                "grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-3 gap-4",
                (1..=6)
                    .map(|i| {
                        UiElement::card(vec![
                            UiElement::text("text-lg font-medium", &format!("Card {}", i)),
                            UiElement::text("text-sm text-gray-500", "This is a generated card."),
                            UiElement::button("Open"),
                        ])
                    })
                    .collect(),
            )
        } else {
            UiElement::container(
                "flex flex-col items-center gap-4",
                vec![
                    UiElement::text("text-3xl font-bold", "Generated UI"),
                    UiElement::text(
                        "text-sm text-gray-500",
                        "Describe what you want on the left and regenerate.",
                    ),
                    UiElement::button("Primary action"),
                ],
            )
        };
        GeneratedUiSchema::new(root)
    }

    /// The refined layout. Button labels grow when the prompt asks for
    /// emphasis.
    pub fn refined_layout(prompt: &str) -> GeneratedUiSchema {
        let (primary, secondary) = if wants_emphasis(prompt) {
            ("Primary (Large)", "Secondary (Large)")
        } else {
            ("Primary", "Secondary")
        };
        GeneratedUiSchema::new(UiElement::container(
            "mx-auto max-w-2xl flex flex-col gap-4",
            vec![
                UiElement::text("text-2xl font-semibold", "Updated UI from Sketch"),
                UiElement::input("Search..."),
                UiElement::container(
                    "grid grid-cols-2 gap-3",
                    vec![UiElement::button(primary), UiElement::button(secondary)],
                ),
                UiElement::card(vec![
                    UiElement::text("text-lg font-medium", "Card title"),
                    UiElement::text("text-sm text-gray-500", "Tweaked from your sketch overlay."),
                    UiElement::button("Continue"),
                ]),
            ],
        ))
    }
}

#[async_trait]
impl Generator for RuleGenerator {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn generate(&self, prompt: &str) -> GenerationResult<GeneratedOutput> {
        Ok(GeneratedOutput::ui(Self::layout_for(prompt)))
    }

    async fn reprompt(
        &self,
        prompt: &str,
        _previous: Option<&GeneratedUiSchema>,
        _overlay: Option<&ImageBlob>,
    ) -> GenerationResult<GeneratedOutput> {
        Ok(GeneratedOutput::ui(Self::refined_layout(prompt)))
    }
}
