pub const REPAIR_SYSTEM_PROMPT: &str = "You are an expert in LaTeX typesetting.";

/// User prompt asking for a minimal fix of `snippet` given compiler output.
pub fn repair_prompt(snippet: &str, diagnostics: &str) -> String {
    format!(
        r"The snippet between <provided-snippet> tags is part of a larger LaTeX file that does not compile.
Compiler errors logged while typesetting the snippet are given between <errors> tags.

Correct the snippet so that it compiles as LaTeX without errors.

- Return only the corrected snippet.
- Modify the input as little as possible and keep its meaning.
- The snippet is pasted into an existing document: do not add a preamble or a document environment.
- Do not start new sections, subsections or subsubsections.
- Close unmatched braces and environments where the context suggests.
- Fill missing command arguments with placeholders, e.g. \frac{{?}}{{?}}.
- Wrap undefined commands in \texttt with the backslash written as \textbackslash.
- Do not explain the changes and do not wrap the answer in tags.
- If the snippet is already valid, return it unchanged.

<provided-snippet>
{snippet}
</provided-snippet>

<errors>
{diagnostics}
</errors>
"
    )
}
