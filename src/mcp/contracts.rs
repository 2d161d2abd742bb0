use serde_json::json;

pub const TOOL_CONVERT_CONTENTS: &str = "convert-contents";

pub const PROTOCOL_VERSION: &str = "2025-11-25";

pub const SUPPORTED_FORMATS: [&str; 10] = [
    "markdown", "html", "pdf", "docx", "rst", "latex", "epub", "txt", "ipynb", "odt",
];

/// Output formats that are never returned inline and need `output_file`.
pub const ADVANCED_FORMATS: [&str; 5] = ["pdf", "docx", "rst", "latex", "epub"];

pub const DEFAULT_FORMAT: &str = "markdown";

pub const ARGUMENT_NAMES: [&str; 8] = [
    "contents",
    "input_file",
    "input_format",
    "output_format",
    "output_file",
    "reference_doc",
    "filters",
    "defaults_file",
];

pub fn convert_contents_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "contents": {
                "type": "string",
                "description": "The content to be converted (required if input_file not provided)"
            },
            "input_file": {
                "type": "string",
                "description": "Complete path to input file including filename and extension (e.g., '/path/to/input.md')"
            },
            "input_format": {
                "type": "string",
                "description": "Source format of the content (defaults to markdown)",
                "default": DEFAULT_FORMAT,
                "enum": SUPPORTED_FORMATS
            },
            "output_format": {
                "type": "string",
                "description": "Desired output format (defaults to markdown)",
                "default": DEFAULT_FORMAT,
                "enum": SUPPORTED_FORMATS
            },
            "output_file": {
                "type": "string",
                "description": "Complete path where to save the output including filename and extension (required for pdf, docx, rst, latex, epub formats)"
            },
            "reference_doc": {
                "type": "string",
                "description": "Path to a reference document to use for styling (supported for docx output format)"
            },
            "filters": {
                "type": "array",
                "items": { "type": "string" },
                "description": "List of Pandoc filter paths to apply during conversion. Filters are applied in the order specified."
            },
            "defaults_file": {
                "type": "string",
                "description": "Path to a Pandoc defaults file (YAML) containing conversion options. Similar to using pandoc -d option."
            }
        },
        "additionalProperties": false
    })
}

pub const CONVERT_CONTENTS_DESCRIPTION: &str = "\
Converts content between different formats. Transforms input content from any supported format \
into the specified output format.

CRITICAL REQUIREMENTS:
1. PDF Conversion:
   * A TeX distribution providing xelatex MUST be installed before attempting PDF conversion
   * Ubuntu/Debian: `sudo apt-get install texlive-xetex`
   * macOS: `brew install texlive`
   * Windows: install MiKTeX or TeX Live

2. File Paths:
   * When asked to save or convert to a file, provide the complete directory path, filename and extension
   * Example: '/path/to/story.pdf' or 'C:\\Documents\\story.pdf'
   * The tool will NOT generate filenames or extensions

3. File Location After Conversion:
   * After a successful conversion the tool reports the exact path of the saved file
   * Look for the message: 'Content successfully converted and saved to: [file_path]'

Supported formats:
- Basic: txt, html, markdown, ipynb, odt
- Advanced (REQUIRE complete file paths): pdf, docx, rst, latex, epub

DOCX styling:
   * Use reference_doc to apply the styles of a template document to DOCX output
   * Generate a template with: pandoc -o template.docx --print-default-data-file reference.docx

Pandoc filters:
   * Use filters to run Pandoc filters during conversion, applied in the order given
   * Filters must be executable scripts
   * Relative paths are searched in the working directory, next to the defaults file, then in ~/.pandoc/filters

Defaults files:
   * Use defaults_file to pass a Pandoc defaults file (YAML), like `pandoc -d`
   * The requested output_format always takes precedence over the `to` entry of the defaults file

Note: after conversion, always check the success message for the exact file location.";
