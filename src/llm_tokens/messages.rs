/// Trailer appended to `.md` responses served through `?llm=`.
pub fn llm_footer(token: &str) -> String {
    let usage = format!(
        "> Append `?llm={}` to all .md URLs on this site. Use curl -s for requests.",
        token
    );
    [
        "",
        "",
        "---",
        "",
        usage.as_str(),
        "> Token expires in a few hours. If you get a 401, ask the user for a new token.",
    ]
    .join("\n")
}

/// Body of the 401 returned for protected `.md` routes.
pub fn llm_401_response() -> String {
    [
        "# Authentication Required",
        "",
        "This page requires an LLM session token.",
        "",
        "Append `?llm=YOUR_TOKEN` to .md URLs. Use curl -s to fetch pages.",
        "Ask the documentation owner for a token.",
        "",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_embeds_token() {
        let footer = llm_footer("AbCdEfGhIjKlMnOpQrStUvWx");
        assert!(footer.starts_with("\n\n---\n\n"));
        assert!(footer.contains("`?llm=AbCdEfGhIjKlMnOpQrStUvWx`"));
        assert!(footer.ends_with("ask the user for a new token."));
    }

    #[test]
    fn test_unauthorized_body() {
        let body = llm_401_response();
        assert!(body.starts_with("# Authentication Required\n"));
        assert!(body.contains("?llm=YOUR_TOKEN"));
        assert!(body.ends_with("for a token.\n"));
    }
}
