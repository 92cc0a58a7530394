//! Study reports.
//!
//! The engine assembles a [`Report`] value and hands it to a [`ReportRenderer`],
//! which persists it and returns where it went. Rendering never feeds back into the
//! engine. [`MarkdownRenderer`] writes one `.md` file per report.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::EngineError;
use crate::generator::{BloomAssessment, ConceptMap, FeynmanAssessment, StudyMaterial};
use crate::learning::graph::IngestReport;
use crate::learning::types::BloomLevel;
use crate::store::analytics::InsightsSummary;

/// Table descriptions are cut to this many characters.
const DESCRIPTION_PREVIEW: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    /// File name without extension.
    pub file_stem: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Paragraph { text: String },
    /// Highlighted one-liner, such as a score.
    Callout { text: String },
    Bullets { items: Vec<String> },
    Numbered { items: Vec<String> },
    Table { header: Vec<String>, rows: Vec<Vec<String>> },
    Code { language: String, source: String },
}

impl Section {
    fn new(heading: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            heading: heading.into(),
            blocks,
        }
    }
}

fn paragraph(text: impl Into<String>) -> Block {
    Block::Paragraph { text: text.into() }
}

fn callout(text: impl Into<String>) -> Block {
    Block::Callout { text: text.into() }
}

/// Bullet list, or `fallback` as the single item when `items` is empty.
fn bullets_or(items: &[String], fallback: &str) -> Block {
    let items = if items.is_empty() {
        vec![fallback.to_string()]
    } else {
        items.to_vec()
    };
    Block::Bullets { items }
}

/// Persists a finished report.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, report: &Report) -> Result<PathBuf, EngineError>;
}

/// Writes reports as Markdown files under one directory.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    dir: PathBuf,
}

impl MarkdownRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportRenderer for MarkdownRenderer {
    fn render(&self, report: &Report) -> Result<PathBuf, EngineError> {
        let path = self.dir.join(format!("{}.md", slugify(&report.file_stem)));
        let report_err = |source| EngineError::Report {
            path: path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(report_err)?;
        std::fs::write(&path, to_markdown(report)).map_err(report_err)?;

        debug!(path = %path.display(), "report written");
        Ok(path)
    }
}

/// Replace anything but letters, digits, `-` and `_` with `_`. Non-ASCII letters are kept.
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug
    }
}

pub fn to_markdown(report: &Report) -> String {
    let mut out = format!("# {}\n", report.title);
    for section in &report.sections {
        if !section.heading.is_empty() {
            let _ = write!(out, "\n## {}\n", section.heading);
        }
        for block in &section.blocks {
            out.push('\n');
            write_block(&mut out, block);
        }
    }
    out
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Paragraph { text } => {
            let _ = writeln!(out, "{text}");
        }
        Block::Callout { text } => {
            for line in text.lines() {
                let _ = writeln!(out, "> {line}");
            }
        }
        Block::Bullets { items } => {
            for item in items {
                let _ = writeln!(out, "- {item}");
            }
        }
        Block::Numbered { items } => {
            for (i, item) in items.iter().enumerate() {
                let _ = writeln!(out, "{}. {item}", i + 1);
            }
        }
        Block::Table { header, rows } => {
            let _ = writeln!(out, "| {} |", header.join(" | "));
            let _ = writeln!(out, "|{}", "---|".repeat(header.len()));
            for row in rows {
                let cells: Vec<String> = row.iter().map(|c| table_cell(c)).collect();
                let _ = writeln!(out, "| {} |", cells.join(" | "));
            }
        }
        Block::Code { language, source } => {
            let _ = writeln!(out, "```{language}\n{}\n```", source.trim_end());
        }
    }
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn preview(text: &str) -> String {
    text.chars().take(DESCRIPTION_PREVIEW).collect()
}

/// Concept table and learning path for a finished build.
pub fn knowledge_graph_report(map: &ConceptMap, ingest: &IngestReport) -> Report {
    let rows = map
        .concepts
        .iter()
        .enumerate()
        .map(|(i, concept)| {
            vec![
                (i + 1).to_string(),
                concept.clone(),
                preview(map.descriptions.get(concept).map_or("", String::as_str)),
                format!("{}/5", map.difficulty_levels.get(concept).copied().unwrap_or(1)),
            ]
        })
        .collect();

    let mut sections = vec![
        Section::new(
            "",
            vec![callout(format!(
                "**{} concepts** organized for optimal learning ({} new, {} already known)",
                map.concepts.len(),
                ingest.created.len(),
                ingest.reused.len()
            ))],
        ),
        Section::new(
            "Concept Map",
            vec![Block::Table {
                header: ["#", "Concept", "Description", "Difficulty"]
                    .map(String::from)
                    .to_vec(),
                rows,
            }],
        ),
        Section::new(
            "Recommended Learning Path",
            vec![Block::Numbered {
                items: map.learning_order.clone(),
            }],
        ),
    ];

    if !ingest.broken_cycles.is_empty() {
        let items = ingest
            .broken_cycles
            .iter()
            .map(|cycle| cycle.join(" -> "))
            .collect();
        sections.push(Section::new(
            "Prerequisite Cycles Broken",
            vec![Block::Bullets { items }],
        ));
    }

    Report {
        title: format!("{} - Knowledge Graph", map.topic),
        file_stem: format!("{}_KnowledgeGraph", map.topic),
        sections,
    }
}

pub fn study_guide_report(concept_id: &str, concept: &str, material: &StudyMaterial) -> Report {
    let mut visual = vec![callout(&material.visual_description)];
    if !material.mermaid_diagram.trim().is_empty() {
        visual.push(Block::Code {
            language: "mermaid".into(),
            source: material.mermaid_diagram.clone(),
        });
    }

    Report {
        title: concept.to_string(),
        file_stem: format!("{concept_id}_{concept}_StudyGuide"),
        sections: vec![
            Section::new("Explanation", vec![paragraph(&material.verbal_explanation)]),
            Section::new(
                "Key Points",
                vec![Block::Bullets {
                    items: material.key_points.clone(),
                }],
            ),
            Section::new("Visual Representation", visual),
            Section::new(
                "Code Example",
                vec![Block::Code {
                    language: String::new(),
                    source: material.code_example.clone(),
                }],
            ),
            Section::new("Real-World Analogy", vec![callout(&material.real_world_analogy)]),
            Section::new(
                "Common Mistakes",
                vec![bullets_or(&material.common_mistakes, "None listed")],
            ),
            Section::new(
                "Practice Questions",
                vec![Block::Numbered {
                    items: material.practice_questions.clone(),
                }],
            ),
        ],
    }
}

pub fn feynman_report(
    concept: &str,
    explanation: &str,
    assessment: &FeynmanAssessment,
    at: DateTime<Utc>,
) -> Report {
    let score = |s: u8| format!("{}/10", s.min(FeynmanAssessment::MAX_SCORE));
    let rows = vec![
        vec!["Accuracy".to_string(), score(assessment.accuracy_score)],
        vec!["Clarity".to_string(), score(assessment.clarity_score)],
        vec!["Completeness".to_string(), score(assessment.completeness_score)],
        vec!["Depth".to_string(), score(assessment.depth_score)],
    ];

    let mut sections = vec![
        Section::new("", vec![callout(format!("**{:.1}/10**", assessment.average()))]),
        Section::new(
            "Dimension Scores",
            vec![Block::Table {
                header: vec!["Dimension".into(), "Score".into()],
                rows,
            }],
        ),
        Section::new("Your Explanation", vec![callout(explanation)]),
        Section::new(
            "Strengths",
            vec![bullets_or(&assessment.strengths, "Keep practicing!")],
        ),
        Section::new(
            "Knowledge Gaps",
            vec![bullets_or(&assessment.gaps, "No major gaps identified")],
        ),
        Section::new(
            "Misconceptions",
            vec![bullets_or(&assessment.misconceptions, "None detected")],
        ),
        Section::new("Feedback", vec![paragraph(&assessment.feedback)]),
    ];
    if !assessment.suggested_topics.is_empty() {
        sections.push(Section::new(
            "Suggested Topics",
            vec![Block::Bullets {
                items: assessment.suggested_topics.clone(),
            }],
        ));
    }

    Report {
        title: format!("Feynman Assessment: {concept}"),
        file_stem: format!("Feynman_{concept}_{}", at.format("%Y%m%d%H%M%S")),
        sections,
    }
}

pub fn bloom_report(
    concept_id: &str,
    concept: &str,
    level: BloomLevel,
    assessment: &BloomAssessment,
) -> Report {
    let mut sections = vec![Section::new(
        "",
        vec![
            callout(format!("**Level {}: {level}**", level.level())),
            paragraph(&assessment.level_justification),
        ],
    )];

    for (i, q) in assessment.questions.iter().enumerate() {
        let mut blocks = vec![
            paragraph(format!("**{}**", q.question)),
            paragraph(format!("*Expected:* {}", q.expected_answer)),
            paragraph(format!("*Rubric:* {}", q.scoring_rubric)),
        ];
        if !q.hints.is_empty() {
            blocks.push(paragraph(format!("*Hints:* {}", q.hints.join(", "))));
        }
        sections.push(Section::new(
            format!("Question {} ({})", i + 1, q.cognitive_verb),
            blocks,
        ));
    }

    Report {
        title: format!("Bloom's Assessment: {concept}"),
        file_stem: format!("Bloom_{concept_id}_{concept}_L{}", level.level()),
        sections,
    }
}

pub fn insights_report(summary: &InsightsSummary, at: DateTime<Utc>) -> Report {
    let overview = vec![
        format!("Total sessions: {}", summary.total_sessions),
        format!("Total study time: {} minutes", summary.total_minutes),
        format!("Average score: {:.1}/10", summary.average_score),
        format!("Best study hour: {}:00", summary.best_hour),
    ];

    let activity_rows = summary
        .activity_counts
        .iter()
        .map(|(activity, count)| vec![activity.to_string(), count.to_string()])
        .collect();

    let recent_rows = summary
        .recent
        .iter()
        .map(|e| {
            vec![
                e.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                e.concept.clone(),
                e.activity.to_string(),
                format!("{:.1}", e.score),
            ]
        })
        .collect();

    Report {
        title: "Learning Analytics Report".into(),
        file_stem: format!("Insights_{}", at.format("%Y%m%d")),
        sections: vec![
            Section::new("Overview", vec![Block::Bullets { items: overview }]),
            Section::new(
                "Activity Breakdown",
                vec![Block::Table {
                    header: vec!["Activity".into(), "Sessions".into()],
                    rows: activity_rows,
                }],
            ),
            Section::new(
                "Bloom Progression",
                vec![paragraph(summary.bloom_progression_names().join(" -> "))],
            ),
            Section::new(
                "Recent Activity",
                vec![Block::Table {
                    header: ["When", "Concept", "Activity", "Score"]
                        .map(String::from)
                        .to_vec(),
                    rows: recent_rows,
                }],
            ),
            Section::new(
                "Recommendations",
                vec![Block::Bullets {
                    items: summary.recommendations.clone(),
                }],
            ),
        ],
    }
}
