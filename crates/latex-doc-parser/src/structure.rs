use latex_doc_model::markers;
use latex_doc_model::{
    generated_label, ContentMap, Document, DocumentParts, RegionContent, SectionRef,
};
use latex_extract::{partition, partition_repeated, split_at_first, split_lines, LineRecord, Segment};
use tracing::debug;

use crate::error::{ParseError, Result};

const CLASS: usize = 0;
const BEGIN: usize = 1;
const TITLE: usize = 2;
const BIBLIOGRAPHY: usize = 3;
const END: usize = 4;

type Detector = fn(&LineRecord) -> bool;

const ENVELOPE: [Detector; 5] = [
    |line| markers::is_document_class(&line.text),
    |line| markers::is_begin_document(&line.text),
    |line| markers::is_maketitle(&line.text),
    |line| markers::is_bibliography_start(&line.text),
    |line| markers::is_end_document(&line.text),
];

const REQUIRED: [(usize, &str); 4] = [
    (CLASS, markers::DOCUMENT_CLASS),
    (BEGIN, markers::BEGIN_DOCUMENT),
    (TITLE, markers::MAKETITLE),
    (END, markers::END_DOCUMENT),
];

/// Parse LaTeX source into a [`Document`] without supporting files.
///
/// Lines are trimmed and `%` comment lines are dropped, except commented-out
/// bibliography commands which still open the bibliography block.
pub fn parse_from_latex(text: &str) -> Result<Document> {
    let lines: Vec<LineRecord> = split_lines(text)
        .into_iter()
        .filter(|line| {
            !markers::is_comment(&line.text) || markers::is_bibliography_start(&line.text)
        })
        .collect();

    let envelope = partition(lines, &ENVELOPE);
    let matched = envelope.detectors();
    debug!(?matched, "partitioned document envelope");

    for (detector, marker) in REQUIRED {
        if !matched.contains(&detector) {
            return Err(ParseError::MissingMarker { marker });
        }
    }
    reject_content(&envelope.head)?;

    let mut parts = DocumentParts::default();
    let mut main_content = Vec::new();

    for Segment {
        detector,
        matched,
        tail,
    } in envelope.segments
    {
        if detector != END {
            reject_repeated_markers(&tail)?;
        }

        match detector {
            CLASS => {
                parts.pre_matter.push(matched.text);
                parts.pre_matter.extend(texts(tail));
            }
            BEGIN => parts.begin_document = texts(tail),
            TITLE => main_content = tail,
            BIBLIOGRAPHY => {
                parts.bibliography.push(matched.text);
                parts.bibliography.extend(texts(tail));
            }
            _ => reject_content(&tail)?,
        }
    }

    let (main, appendix_marker, appendix) =
        split_at_first(main_content, |line| markers::is_appendix(&line.text));
    let main = parse_region(main, false)?;
    let appendix = match appendix_marker {
        Some(_) => Some(parse_region(appendix, true)?),
        None => None,
    };

    debug!(
        main_sections = main.sections.len(),
        appendix_sections = appendix.as_ref().map(|region| region.sections.len()),
        "parsed content regions"
    );

    parts.content = ContentMap::from_regions(main, appendix);

    let duplicates = parts.content.duplicate_labels();
    if !duplicates.is_empty() {
        return Err(ParseError::DuplicateLabels { labels: duplicates });
    }

    Ok(Document::from_parts(parts))
}

fn parse_region(lines: Vec<LineRecord>, in_appendix: bool) -> Result<RegionContent> {
    let split = partition_repeated(lines, |line| markers::is_section_start(&line.text));

    let sections = split
        .segments
        .into_iter()
        .enumerate()
        .map(|(index, segment)| parse_section(index, in_appendix, segment))
        .collect::<Result<Vec<_>>>()?;

    Ok(RegionContent {
        pre_section: texts(split.head),
        sections,
    })
}

fn parse_section(
    index: usize,
    in_appendix: bool,
    segment: Segment<LineRecord>,
) -> Result<(SectionRef, Vec<String>)> {
    let heading = segment.matched;
    let Some(title) = markers::command_argument(markers::SECTION, &heading.text) else {
        return Err(ParseError::MalformedMarker {
            line: heading.number,
            marker: markers::SECTION,
            text: heading.text,
        });
    };

    let generated = generated_label(index, in_appendix);
    let mut body = texts(segment.tail);

    // The serializer writes the generated label right after the title.
    if body.first() == Some(&markers::label(&generated)) {
        body.remove(0);
    }

    let section = SectionRef {
        in_appendix,
        title: title.to_string(),
        label: explicit_label(&body),
        generated_label: generated,
    };
    Ok((section, body))
}

/// First `\label{..}` of a section, looking no further than its first
/// subsection.
fn explicit_label(body: &[String]) -> Option<String> {
    body.iter()
        .take_while(|line| !markers::is_subsection_start(line))
        .find(|line| markers::is_label(line))
        .and_then(|line| markers::first_argument(markers::LABEL, line))
        .map(str::to_string)
}

fn reject_content(lines: &[LineRecord]) -> Result<()> {
    match lines.iter().find(|line| !line.is_blank()) {
        Some(line) => Err(ParseError::ContentOutsideEnvelope {
            line: line.number,
            text: line.text.clone(),
        }),
        None => Ok(()),
    }
}

fn reject_repeated_markers(lines: &[LineRecord]) -> Result<()> {
    for line in lines {
        let marker = if markers::is_document_class(&line.text) {
            markers::DOCUMENT_CLASS
        } else if markers::is_begin_document(&line.text) {
            markers::BEGIN_DOCUMENT
        } else {
            continue;
        };
        return Err(ParseError::UnexpectedMarker {
            line: line.number,
            marker,
        });
    }
    Ok(())
}

fn texts(lines: Vec<LineRecord>) -> Vec<String> {
    lines.into_iter().map(|line| line.text).collect()
}
