//! Shared HTML components: escaping, record popups, the legend and the page shell.

use crate::models::{Category, Mode, Record};
use std::collections::BTreeSet;

use super::map_js::render_map_js;
use super::styles::STYLE;

pub const COMPANIES_HOUSE: &str = "https://find-and-update.company-information.service.gov.uk/company/";

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ============================================================================
// Record Popup
// ============================================================================

pub fn popup_html(record: &Record) -> String {
    let m = record.metadata();
    let id = html_escape(record.id());
    let company_url = format!("{COMPANIES_HOUSE}{id}");
    let psc_url = format!("{company_url}/persons-with-significant-control");

    let mut html = format!(
        r#"<b>PSC: <b><a href="{psc_url}" target="_blank">{psc}</a></b>"#,
        psc = html_escape(&m.psc_name),
    );
    if let Some(ceased) = &m.ceased_on {
        html.push_str(&format!(
            "<br><span style='font-size:12px;'>(ceased to be PSC on {})</span>",
            html_escape(ceased)
        ));
    }
    html.push_str(&format!(
        r#"</b><br>{address}<br><br>Owner of <b><a href="{company_url}" target="_blank">{company}</a></b>"#,
        address = html_escape(&m.psc_address),
        company = html_escape(&m.company_name),
    ));
    if !m.uk_company_address.is_empty() {
        html.push_str(&format!("<br>{}", html_escape(&m.uk_company_address)));
    }
    html.push_str(&format!(
        "<br>Incorporated {}, {}",
        html_escape(&m.incorporation_date),
        html_escape(&m.company_status)
    ));
    if !m.warnings.is_empty() {
        html.push_str(&format!("<br><b>{}</b>", m.warnings.join("<br>")));
    }
    html.push_str(&format!(
        "<br><br>Accounting basis: {}<br>Stated industry codes: {}",
        html_escape(&m.accounts_type),
        html_escape(&m.sics)
    ));
    html.push_str(&format!(
        r#"<br><br><button class="show-link" data-company="{id}">Show Link</button>"#
    ));
    html
}

// ============================================================================
// Legend
// ============================================================================

fn legend_label(category: Category) -> &'static str {
    match category {
        Category::Green => "No warnings",
        Category::Orange => "Dormant company",
        Category::Red => "Overdue accounts or office problems",
        Category::Grey => "Ceased to be PSC",
        Category::Black => "Company not active",
    }
}

pub fn legend_html(visible: &BTreeSet<Category>) -> String {
    let mut html = String::from(r#"<div id="legendBox">"#);
    for category in Category::ALL {
        let active = visible.contains(&category);
        html.push_str(&format!(
            r#"<div class="legend-item{inactive}" data-category="{cat}" data-active="{active}">
                <span class="legend-box" style="background-color:{cat}"></span>{label}
            </div>"#,
            inactive = if active { "" } else { " inactive" },
            cat = category.as_str(),
            label = legend_label(category),
        ));
    }
    html.push_str("</div>");
    html
}

// ============================================================================
// Page Shell
// ============================================================================

pub fn base_html(title: &str, head: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    {head}
    <style>{STYLE}</style>
</head>
<body>
    {content}
</body>
</html>"#,
        title = html_escape(title),
    )
}

const LEAFLET_HEAD: &str = r#"
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
    <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.Default.css">
    <link rel="stylesheet" href="https://unpkg.com/leaflet-draw@1.0.4/dist/leaflet.draw.css">
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <script src="https://unpkg.com/leaflet.markercluster@1.5.3/dist/leaflet.markercluster.js"></script>
    <script src="https://unpkg.com/leaflet-draw@1.0.4/dist/leaflet.draw.js"></script>
"#;

pub fn map_page(mode: Mode, visible: &BTreeSet<Category>) -> String {
    let (psc_checked, uk_checked) = match mode {
        Mode::Psc => ("checked", ""),
        Mode::UkCompany => ("", "checked"),
    };

    let content = format!(
        r#"<div id="map"></div>

    <div class="panel top-left">
        <input type="text" id="searchInput" placeholder="Search companies or PSCs...">
        <div id="searchResults" class="results"></div>
        <input type="text" id="placeSearchInput" placeholder="Search places (Enter)...">
        <div id="placeSearchResults" class="results"></div>
    </div>

    <div class="panel top-right">
        <button id="shareViewButton">Share view</button>
        <button id="selectAreaButton">Select area</button>
        <button id="clearLinksButton" style="display:none">Clear links</button>
        <div id="shareUrlContainer">
            <input type="text" id="shareUrlInput" readonly>
            <button id="copyShareUrlButton">Copy</button>
        </div>
    </div>

    <div class="panel bottom-left">
        {legend}
        <div id="modeToggleContainer">
            <label><input type="radio" name="locationMode" value="psc" {psc_checked}> PSC location</label>
            <label><input type="radio" name="locationMode" value="uk" {uk_checked}> UK company location</label>
        </div>
    </div>

    <script>{script}</script>"#,
        legend = legend_html(visible),
        script = render_map_js(),
    );

    base_html("Foreign PSCs of UK companies", LEAFLET_HEAD, &content)
}
