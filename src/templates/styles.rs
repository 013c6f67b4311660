//! CSS styles for the map page.

// ============================================================================
// CSS Styles
// ============================================================================

pub const STYLE: &str = r#"
:root {
    --bg: #fdf6e3;
    --fg: #586e75;
    --accent: #eee8d5;
    --border: #93a1a1;
    --link: #268bd2;
}

* { box-sizing: border-box; }
html, body { margin: 0; padding: 0; height: 100%; font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; color: var(--fg); }
#map { position: absolute; inset: 0; }

.panel {
    position: absolute;
    z-index: 1000;
    background: var(--bg);
    border: 1px solid var(--border);
    border-radius: 4px;
    padding: 0.5rem 0.75rem;
    box-shadow: 0 2px 8px rgba(0,0,0,0.2);
}
.panel.top-left { top: 10px; left: 10px; width: 280px; }
.panel.bottom-left { bottom: 20px; left: 10px; }
.panel.top-right { top: 10px; right: 10px; }

.panel input[type=text] { width: 100%; padding: 0.35rem; border: 1px solid var(--border); border-radius: 3px; }
.panel button { margin: 0.2rem 0.2rem 0 0; padding: 0.3rem 0.6rem; border: 1px solid var(--border); background: var(--accent); border-radius: 3px; cursor: pointer; }

.results { max-height: 240px; overflow-y: auto; }
.result-item { padding: 0.25rem 0; cursor: pointer; border-bottom: 1px solid var(--accent); }
.result-item:hover { color: var(--link); }

.legend-item { display: flex; align-items: center; gap: 0.4rem; cursor: pointer; padding: 0.1rem 0; }
.legend-item.inactive { opacity: 0.4; }
.legend-box { width: 12px; height: 12px; border-radius: 50%; border: 1px solid black; }

.toast {
    position: fixed;
    top: 10px;
    right: 10px;
    z-index: 1500;
    background: yellow;
    padding: 10px;
    border: 1px solid #ccc;
    border-radius: 4px;
    box-shadow: 0 0 5px rgba(0,0,0,0.5);
}
#shareUrlContainer { display: none; }
"#;
