use crate::error::Result;
use crate::render::Report;

/// Render a self-contained HTML report (data embedded as JSON, charts drawn
/// as SVG by the page script).
///
/// Important: we avoid `format!()` because the HTML contains many `{}` from JS
/// template literals (e.g., `${x}`), which would conflict with Rust formatting.
pub fn render_html_report(report: &Report) -> Result<String> {
    // `</` inside a string literal would end the script element early.
    let json = serde_json::to_string(report)?.replace("</", "<\\/");

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Performance Graphs</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  header h1 { margin: 0 0 4px 0; font-size: 22px; }
  .muted { color: #777; font-size: 13px; }
  .tabs { display: flex; gap: 4px; padding: 8px 16px 0 16px; border-bottom: 1px solid #ddd; flex-wrap: wrap; }
  .tab { padding: 6px 12px; border: 1px solid #ddd; border-bottom: none; border-radius: 6px 6px 0 0; background: #fafafa; cursor: pointer; }
  .tab.selected { background: #e9f2ff; border-color: #cfe3ff; }
  .main { padding: 12px 16px; }
  section { border-bottom: 1px solid #eee; padding-bottom: 12px; margin-bottom: 12px; }
  .chart { margin: 12px 0; }
  .chart h4 { margin: 4px 0; font-weight: 500; }
  svg text { font-size: 11px; fill: #333; }
  .links a { margin-right: 12px; }

  table { border-collapse: collapse; margin-top: 8px; }
  th, td { border-bottom: 1px solid #eee; padding: 4px 8px; text-align: left; font-size: 13px; }
  th { background: white; border-bottom: 1px solid #ddd; }
  code { font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; font-size: 13px; }
</style>
</head>
<body>
<header>
  <h1 id="title"></h1>
  <div id="subtitle" class="muted"></div>
</header>
<div class="tabs" id="tabs"></div>
<div class="main" id="main"></div>

<script>
// Embedded report data (JSON object literal)
const DATA = __DATA__;

const SVG_NS = "http://www.w3.org/2000/svg";
const W = 720, H = 380;
const M = { top: 20, right: 70, bottom: 50, left: 80 };
const PALETTE = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
                 "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf"];

const state = { selected: 0 };

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function el(name, attrs, parent) {
  const e = document.createElementNS(SVG_NS, name);
  for (const [k, v] of Object.entries(attrs || {})) e.setAttribute(k, v);
  if (parent) parent.appendChild(e);
  return e;
}

function text(parent, x, y, s, attrs) {
  const t = el("text", Object.assign({ x, y }, attrs || {}), parent);
  t.textContent = s;
  return t;
}

function newSvg(w, h) {
  return el("svg", { width: w || W, height: h || H, viewBox: `0 0 ${w || W} ${h || H}` });
}

function extent(values, includeZero) {
  const v = values.filter(x => x !== null && Number.isFinite(x));
  let lo = v.length ? Math.min(...v) : 0;
  let hi = v.length ? Math.max(...v) : 1;
  if (includeZero) { lo = Math.min(lo, 0); hi = Math.max(hi, 0); }
  if (lo === hi) { hi = lo + 1; }
  return [lo, hi];
}

function scale(domain, range) {
  const [d0, d1] = domain, [r0, r1] = range;
  return x => r0 + (x - d0) * (r1 - r0) / (d1 - d0);
}

function fmtTick(x) {
  const a = Math.abs(x);
  if (a >= 1e6) return (x / 1e6).toFixed(1) + "M";
  if (a >= 1e3) return (x / 1e3).toFixed(1) + "k";
  return (Math.round(x * 100) / 100).toString();
}

function axisLeft(svg, y, domain, label, x0, anchor) {
  const x = x0 === undefined ? M.left : x0;
  const side = anchor === "start" ? 1 : -1;
  el("line", { x1: x, y1: M.top, x2: x, y2: H - M.bottom, stroke: "#999" }, svg);
  for (let i = 0; i <= 5; i++) {
    const v = domain[0] + (domain[1] - domain[0]) * i / 5;
    const yy = y(v);
    el("line", { x1: x, y1: yy, x2: x + side * 4, y2: yy, stroke: "#999" }, svg);
    text(svg, x + side * 6, yy + 4, fmtTick(v), { "text-anchor": anchor || "end" });
  }
  const lx = x + side * 60;
  const ly = (M.top + H - M.bottom) / 2;
  text(svg, lx, ly, label, { "text-anchor": "middle", transform: `rotate(-90 ${lx} ${ly})` });
}

function axisBottom(svg, x, domain, label, ticks) {
  const y = H - M.bottom;
  el("line", { x1: M.left, y1: y, x2: W - M.right, y2: y, stroke: "#999" }, svg);
  if (ticks !== false) {
    for (let i = 0; i <= 5; i++) {
      const v = domain[0] + (domain[1] - domain[0]) * i / 5;
      const xx = x(v);
      el("line", { x1: xx, y1: y, x2: xx, y2: y + 4, stroke: "#999" }, svg);
      text(svg, xx, y + 16, fmtTick(v), { "text-anchor": "middle" });
    }
  }
  text(svg, (M.left + W - M.right) / 2, H - 12, label, { "text-anchor": "middle" });
}

function legend(svg, items, x, y, anchor) {
  items.forEach((it, i) => {
    const yy = y + i * 16;
    const tx = anchor === "end" ? x - 16 : x + 16;
    el("rect", { x: anchor === "end" ? x - 12 : x, y: yy - 9, width: 12, height: 10, fill: it.color, opacity: it.opacity || 1 }, svg);
    text(svg, tx, yy, it.label, { "text-anchor": anchor || "start" });
  });
}

function linePath(xs, ys, x, y) {
  let d = "", pen = false;
  for (let i = 0; i < xs.length; i++) {
    if (ys[i] === null) { pen = false; continue; }
    d += (pen ? "L" : "M") + x(xs[i]) + "," + y(ys[i]);
    pen = true;
  }
  return d;
}

function drawBarLine(c) {
  const svg = newSvg();
  const xs = c.bar.x;
  const xDom = xs.length ? [Math.min(...xs) - 0.5, Math.max(...xs) + 0.5] : [0, 1];
  const x = scale(xDom, [M.left, W - M.right]);
  const yBarDom = extent(c.bar.y, true);
  const yLineDom = extent(c.line.y, true);
  const yBar = scale(yBarDom, [H - M.bottom, M.top]);
  const yLine = scale(yLineDom, [H - M.bottom, M.top]);
  const bw = Math.max(1, (W - M.left - M.right) / Math.max(xs.length, 1) * 0.8);

  xs.forEach((xv, i) => {
    const v = c.bar.y[i];
    if (v === null) return;
    const top = yBar(Math.max(v, 0)), bottom = yBar(Math.min(v, 0));
    el("rect", { x: x(xv) - bw / 2, y: top, width: bw, height: Math.max(0, bottom - top), fill: c.bar.color, opacity: 0.6 }, svg);
  });
  el("path", { d: linePath(c.line.x, c.line.y, x, yLine), fill: "none", stroke: c.line.color, "stroke-width": 1.5 }, svg);

  axisLeft(svg, yBar, yBarDom, c.bar_axis);
  axisLeft(svg, yLine, yLineDom, c.line_axis, W - M.right, "start");
  axisBottom(svg, x, xDom, c.x_label);
  legend(svg, [{ label: c.bar.label, color: c.bar.color, opacity: 0.6 }], M.left + 8, M.top + 10);
  legend(svg, [{ label: c.line.label, color: c.line.color }], W - M.right - 8, M.top + 10, "end");
  return svg;
}

function drawScatter(c) {
  const svg = newSvg();
  const xDom = extent(c.series.x, false);
  const yDom = extent(c.series.y, true);
  const x = scale(xDom, [M.left, W - M.right]);
  const y = scale(yDom, [H - M.bottom, M.top]);
  c.series.x.forEach((xv, i) => {
    const yv = c.series.y[i];
    if (yv === null) return;
    el("circle", { cx: x(xv), cy: y(yv), r: 3.5, fill: c.series.color }, svg);
  });
  axisLeft(svg, y, yDom, c.y_label);
  axisBottom(svg, x, xDom, c.x_label);
  return svg;
}

function drawPie(c) {
  const svg = newSvg(W, H);
  const cx = 200, cy = H / 2, r = 150;
  const total = c.slices.reduce((a, s) => a + Math.max(s.value, 0), 0);
  // Counter-clockwise from 140 degrees, like the classic pie layout.
  let angle = 140 * Math.PI / 180;
  c.slices.forEach((s, i) => {
    const color = PALETTE[i % PALETTE.length];
    if (total <= 0 || s.value <= 0) return;
    const sweep = 2 * Math.PI * s.value / total;
    if (sweep >= 2 * Math.PI - 1e-9) {
      el("circle", { cx, cy, r, fill: color }, svg);
      angle += sweep;
      return;
    }
    const a0 = angle, a1 = angle + sweep;
    const x0 = cx + r * Math.cos(a0), y0 = cy - r * Math.sin(a0);
    const x1 = cx + r * Math.cos(a1), y1 = cy - r * Math.sin(a1);
    const large = sweep > Math.PI ? 1 : 0;
    el("path", { d: `M${cx},${cy} L${x0},${y0} A${r},${r} 0 ${large} 0 ${x1},${y1} Z`, fill: color }, svg);
    angle = a1;
  });
  text(svg, 400, 40, c.legend_title, { "font-weight": "bold" });
  legend(svg, c.slices.map((s, i) => ({ label: s.legend, color: PALETTE[i % PALETTE.length] })), 400, 62);
  return svg;
}

function drawStackedBar(c) {
  const svg = newSvg();
  const n = c.categories.length;
  const totals = c.categories.map((_, i) => c.stacks.reduce((a, s) => a + (s.values[i] || 0), 0));
  const yDom = extent(totals, true);
  const y = scale(yDom, [H - M.bottom, M.top]);
  const step = (W - M.left - M.right) / Math.max(n, 1);
  const bw = Math.max(1, step * 0.8);
  const base = new Array(n).fill(0);
  c.stacks.forEach((s, si) => {
    const color = PALETTE[si % PALETTE.length];
    s.values.forEach((v, i) => {
      if (!v) return;
      const top = y(base[i] + v), bottom = y(base[i]);
      const r = el("rect", { x: M.left + i * step + (step - bw) / 2, y: top, width: bw, height: Math.max(0, bottom - top), fill: color, opacity: 0.7 }, svg);
      const tip = el("title", {}, r);
      tip.textContent = `${c.categories[i]} | ${s.label}: ${v}`;
      base[i] += v;
    });
  });
  axisLeft(svg, y, yDom, c.y_label);
  axisBottom(svg, null, null, c.x_label, false);
  return svg;
}

function drawErrorBar(c) {
  const svg = newSvg();
  const xs = c.points.map(p => p.x);
  const xDom = xs.length ? [Math.min(...xs) - 1, Math.max(...xs) + 1] : [0, 1];
  const yDom = extent(c.points.flatMap(p => [p.y - p.err, p.y + p.err]), false);
  const x = scale(xDom, [M.left, W - M.right]);
  const y = scale(yDom, [H - M.bottom, M.top]);
  const ids = [...new Set(xs)];
  c.points.forEach(p => {
    const color = PALETTE[ids.indexOf(p.x) % PALETTE.length];
    el("line", { x1: x(p.x), y1: y(p.y - p.err), x2: x(p.x), y2: y(p.y + p.err), stroke: color, opacity: 0.7 }, svg);
    el("circle", { cx: x(p.x), cy: y(p.y), r: 3, fill: color, opacity: 0.7 }, svg);
  });
  for (let i = 0; i <= 5; i++) {
    const yy = y(yDom[0] + (yDom[1] - yDom[0]) * i / 5);
    el("line", { x1: M.left, y1: yy, x2: W - M.right, y2: yy, stroke: "#eee" }, svg);
  }
  axisLeft(svg, y, yDom, c.y_label);
  axisBottom(svg, x, xDom, c.x_label);
  return svg;
}

const DRAW = {
  bar_line: drawBarLine,
  scatter: drawScatter,
  pie: drawPie,
  stacked_bar: drawStackedBar,
  error_bar: drawErrorBar,
};

function renderTable(t) {
  const head = t.columns.map(c => `<th>${escapeHtml(c)}</th>`).join("");
  const body = t.rows.map(r => "<tr>" + r.map(v => `<td><code>${escapeHtml(v)}</code></td>`).join("") + "</tr>").join("");
  return `<table><thead><tr>${head}</tr></thead><tbody>${body}</tbody></table>`;
}

function renderSection(s) {
  const sec = document.createElement("section");
  let html = `<h2>${escapeHtml(s.heading)}</h2>`;
  for (const line of s.lines) html += `<p>${escapeHtml(line)}</p>`;
  if (s.links.length) {
    html += `<div class="links">` + s.links.map(l => `<a href="${escapeHtml(l.href)}" download>${escapeHtml(l.label)}</a>`).join("") + `</div>`;
  }
  sec.innerHTML = html;

  for (const c of s.charts) {
    const box = document.createElement("div");
    box.className = "chart";
    const h = document.createElement("h4");
    h.textContent = c.title;
    box.appendChild(h);
    const draw = DRAW[c.kind];
    if (draw) box.appendChild(draw(c));
    sec.appendChild(box);
  }

  if (s.table) {
    const div = document.createElement("div");
    div.innerHTML = renderTable(s.table);
    sec.appendChild(div);
  }
  return sec;
}

function renderTabs() {
  const bar = document.getElementById("tabs");
  bar.innerHTML = "";
  if (DATA.tabs.length <= 1) { bar.style.display = "none"; return; }
  DATA.tabs.forEach((t, i) => {
    const b = document.createElement("div");
    b.className = "tab" + (state.selected === i ? " selected" : "");
    b.textContent = t.name;
    b.onclick = () => { state.selected = i; renderTabs(); renderMain(); };
    bar.appendChild(b);
  });
}

function renderMain() {
  const main = document.getElementById("main");
  main.innerHTML = "";
  const tab = DATA.tabs[state.selected];
  if (!tab) { main.textContent = "no data"; return; }
  for (const s of tab.sections) main.appendChild(renderSection(s));
}

document.title = DATA.title;
document.getElementById("title").textContent = DATA.title;
document.getElementById("subtitle").textContent = DATA.subtitle;
renderTabs();
renderMain();
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace("__DATA__", &json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Section, Tab};

    fn report(heading: &str) -> Report {
        Report {
            title: "Performance Graphs".to_string(),
            subtitle: "Create graphs for model performance analysis.".to_string(),
            tabs: vec![Tab {
                name: "resnet".to_string(),
                sections: vec![Section {
                    heading: heading.to_string(),
                    ..Section::default()
                }],
            }],
        }
    }

    #[test]
    fn data_is_embedded_as_json() {
        let html = render_html_report(&report("MatMul Operations")).unwrap();
        assert!(!html.contains("__DATA__"));
        assert!(html.contains(r#""heading":"MatMul Operations""#));
        assert!(html.contains(r#""name":"resnet""#));
    }

    #[test]
    fn closing_tags_in_data_cannot_end_the_script() {
        let html = render_html_report(&report("</script><b>x")).unwrap();
        assert!(!html.contains("</script><b>"));
        assert!(html.contains(r#"<\/script><b>x"#));
    }
}
