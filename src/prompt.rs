use url::Url;

/// Extraction mode requested by the host environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionMode {
    /// Extract only the primary event from the content
    #[default]
    Primary,
    /// Extract all related events as separate entries
    MultiDay,
}

const MULTI_DAY_DIRECTIVE: &str =
    "Extract all related events from the content as separate entries. \
     Recurring or multi-day happenings become one entry per occurrence.";

const PRIMARY_DIRECTIVE: &str =
    "Extract only the primary event from the content. Ignore secondary \
     or related happenings.";

/// Tracking query parameters removed from source URLs before they are
/// shown to the model. Keys starting with "utm_" are always removed.
const TRACKING_PARAMS: [&str; 22] = [
    "fbclid",
    "gclid",
    "gclsrc",
    "dclid",
    "wbraid",
    "gbraid",
    "msclkid",
    "twclid",
    "igshid",
    "mc_cid",
    "mc_eid",
    "yclid",
    "_ga",
    "_gl",
    "ref",
    "ref_src",
    "referrer",
    "spm",
    "s_kwcid",
    "vero_id",
    "oly_anon_id",
    "oly_enc_id",
];

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Remove tracking query parameters from a URL string.
///
/// Returns the input unchanged when nothing was removed or when the URL
/// does not parse, preserving whatever formatting the user supplied.
pub fn strip_tracking_params(raw: &str) -> String {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return raw.to_string(),
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let total = url.query_pairs().count();
    if kept.len() == total {
        return raw.to_string();
    }

    let mut cleaned = url.clone();
    cleaned.set_query(None);
    if !kept.is_empty() {
        let mut pairs = cleaned.query_pairs_mut();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
    }
    cleaned.to_string()
}

/// Build the user-facing instruction string for the AI provider.
///
/// Pure assembly: absent optional inputs are simply omitted. The raw
/// content goes last, unmodified.
pub fn build_prompt(
    content: &str,
    instructions: Option<&str>,
    source_url: Option<&str>,
    mode: ExtractionMode,
    tentative: bool,
) -> String {
    let mut sections: Vec<String> = Vec::new();

    let directive = match mode {
        ExtractionMode::MultiDay => MULTI_DAY_DIRECTIVE,
        ExtractionMode::Primary => PRIMARY_DIRECTIVE,
    };
    sections.push(directive.to_string());

    let status = if tentative {
        "The event should be marked as tentative."
    } else {
        "The event should be marked as confirmed."
    };
    sections.push(status.to_string());

    if let Some(instructions) = instructions {
        if !instructions.trim().is_empty() {
            sections.push(format!("Additional instructions:\n{}", instructions));
        }
    }

    if let Some(source_url) = source_url {
        if !source_url.trim().is_empty() {
            sections.push(format!(
                "Source page URL:\n{}",
                strip_tracking_params(source_url)
            ));
        }
    }

    sections.push(format!("Page content:\n{}", content));

    sections.join("\n\n")
}
