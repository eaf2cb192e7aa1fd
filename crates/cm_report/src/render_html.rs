// crates/cm_report/src/render_html.rs
//
// Deterministic, offline HTML renderer.
// - One embedded template, no external assets.
// - The template name ends in `.html`, so minijinja escapes every value.
// - Section order: Headline → Coverage → Alerts → Danger pockets → Families
//   → Mohallas → Resources → Demographics → Footer.

use minijinja::Environment;

use crate::structure::ReportModel;
use crate::ReportError;

const TEMPLATE_NAME: &str = "report.html";

static TEMPLATE: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Campaign Dashboard</title>
<style>
body{font-family:system-ui,-apple-system,Segoe UI,Roboto,Ubuntu,Arial,sans-serif;margin:24px}
h1,h2{margin:0.3em 0}
.grid{display:grid;grid-template-columns:repeat(4,minmax(0,1fr));gap:8px}
.pill{display:inline-block;padding:.2em .6em;border-radius:9999px;background:#eee}
.high{color:#a40000}.medium{color:#8a5a00}.low{color:#555}
table{border-collapse:collapse;margin-bottom:1em}
td,th{padding:4px 8px;border-bottom:1px solid #ddd;text-align:left}
.muted{opacity:0.8}
</style></head><body>
<h1>Campaign Dashboard</h1>
<div class="grid">
  <div><div class="pill">Win probability</div><b>{{ headline.win_probability }}</b> ({{ headline.band }})</div>
  <div><div class="pill">Vote share</div><b>{{ headline.vote_share }}</b></div>
  <div><div class="pill">Expected votes</div><b>{{ headline.expected_votes }}</b></div>
  <div><div class="pill">Voters</div><b>{{ headline.present_voters }}</b> present / {{ headline.total_voters }} ({{ headline.away_voters }} away)</div>
</div>

<h2>Coverage</h2>
<p>Households surveyed: {{ coverage.surveyed }} ({{ coverage.household_coverage }})<br>
Voters tagged: {{ coverage.voter_tagging }}<br>
Fresh surveys: {{ coverage.data_freshness }}</p>
<table><tr>{% for r in vote_breakdown %}<th>{{ r.label }}</th>{% endfor %}</tr>
<tr>{% for r in vote_breakdown %}<td>{{ r.count }}</td>{% endfor %}</tr></table>

<h2>Alerts</h2>
{% if alerts %}<ul>
{% for a in alerts %}<li class="{{ a.severity }}"><b>{{ a.severity }}</b>: {{ a.message }}{% if a.action %} <span class="muted">({{ a.action }})</span>{% endif %}</li>
{% endfor %}</ul>{% else %}<p class="muted">No alerts.</p>{% endif %}

{% macro families(rows) %}<table><tr><th>Household</th><th>Head</th><th>Mohalla</th><th>Influence</th><th>Sentiment</th><th>Voters</th><th>Support</th><th>Expected votes</th></tr>
{% for f in rows %}<tr><td>{{ f.household_id }}</td><td>{{ f.head_name }}</td><td>{{ f.mohalla }}</td><td>{{ f.influence }}</td><td>{{ f.sentiment }}</td><td>{{ f.voters }}</td><td>{{ f.support }}</td><td>{{ f.expected_votes }}</td></tr>
{% endfor %}</table>{% endmacro %}
<h2>Danger pockets</h2>
{% if danger_pockets %}{{ families(danger_pockets) }}{% else %}<p class="muted">None.</p>{% endif %}
<h2>Top families</h2>
{{ families(top_families) }}
<h2>GOTV families</h2>
{% if gotv_families %}{{ families(gotv_families) }}{% else %}<p class="muted">None.</p>{% endif %}

<h2>Mohallas</h2>
<table><tr><th>Mohalla</th><th>Coverage</th><th>Voters</th><th>Swing</th><th>Actionable swing</th><th>Danger pockets</th><th>Expected votes</th></tr>
{% for m in mohallas %}<tr><td>{{ m.name or m.mohalla_id }}</td><td>{{ m.coverage }}</td><td>{{ m.voters }}</td><td>{{ m.swing_universe }}</td><td>{{ m.actionable_swing }}</td><td>{{ m.danger_pockets }}</td><td>{{ m.expected_votes }}</td></tr>
{% endfor %}</table>

<h2>Resources</h2>
<table><tr><th>Mohalla</th><th>Priority</th><th>Vehicles</th><th>Volunteers</th><th>Booth agents</th><th>Reason</th></tr>
{% for r in resources %}<tr><td>{{ r.mohalla }}</td><td class="{{ r.priority }}">{{ r.priority }}</td><td>{{ r.vehicles }}</td><td>{{ r.volunteers }}</td><td>{{ r.booth_agents }}</td><td>{{ r.reason }}</td></tr>
{% endfor %}</table>

<h2>Demographics</h2>
<table><tr><th>Group</th><th>Key</th><th>Voters</th><th>Support</th></tr>
{% for d in demographics %}<tr><td>{{ d.group }}</td><td>{{ d.key }}</td><td>{{ d.voters }}</td><td>{{ d.support }}</td></tr>
{% endfor %}</table>
{% if footer %}
<p class="muted">Run {{ footer.run_id }} · as of {{ footer.as_of }} · engine {{ footer.engine_version }}<br>
snapshot {{ footer.snapshot_sha256 }} · params {{ footer.params_sha256 }}</p>{% endif %}
</body></html>
"#;

pub fn render_html(model: &ReportModel) -> Result<String, ReportError> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE)
        .map_err(|e| ReportError::Template(e.to_string()))?;
    let tmpl = env
        .get_template(TEMPLATE_NAME)
        .map_err(|e| ReportError::Template(e.to_string()))?;
    tmpl.render(model).map_err(|e| ReportError::Template(e.to_string()))
}
