pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Connection instructions served at `GET /mcp`. `extra` is trusted HTML
/// from the site configuration and is appended as is.
pub fn mcp_info_page(name: &str, endpoint: &str, extra: Option<&str>) -> String {
    let name = escape_html(name);
    let endpoint = escape_html(endpoint);
    let client_config = format!(
        r#"{{
  "mcpServers": {{
    "{name}": {{
      "url": "{endpoint}",
      "headers": {{
        "Authorization": "Bearer &lt;YOUR_TOKEN&gt;"
      }}
    }}
  }}
}}"#
    );
    let extra = extra.map(|e| format!("\n{}", e)).unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>MCP — {name}</title>
<style>
  body {{ font-family: system-ui, sans-serif; max-width: 640px; margin: 2rem auto; padding: 0 1rem; color: #1a1a1a; line-height: 1.6; }}
  h1 {{ font-size: 1.4rem; margin-bottom: 0.25rem; }}
  p.subtitle {{ color: #666; margin-top: 0; }}
  code {{ background: #f3f3f3; padding: 0.15em 0.4em; border-radius: 3px; font-size: 0.9em; }}
  pre {{ background: #f3f3f3; padding: 1rem; border-radius: 6px; overflow-x: auto; font-size: 0.85em; line-height: 1.5; }}
  h2 {{ font-size: 1.1rem; margin-top: 2rem; }}
  .endpoint {{ font-size: 1.1em; font-weight: 600; }}
</style>
</head>
<body>
<h1>MCP Server</h1>
<p class="subtitle">{name}</p>

<p>This documentation site exposes an <a href="https://modelcontextprotocol.io">MCP</a> endpoint. Point your client to:</p>
<p class="endpoint"><code>{endpoint}</code></p>
<p>Authentication is required. Use the token provided by your site administrator as a Bearer token.</p>

<h2>Claude Desktop</h2>
<pre>{client_config}</pre>

<h2>Cursor</h2>
<p>Settings → MCP Servers → Add new server:</p>
<pre>Name: {name}
Type: streamable-http
URL:  {endpoint}</pre>
<p>Set the <code>Authorization</code> header to <code>Bearer &lt;YOUR_TOKEN&gt;</code> in the server config.</p>

<h2>Claude Code</h2>
<pre>{client_config}</pre>
{extra}
</body>
</html>"#
    )
}
