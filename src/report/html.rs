//! HTML rendering for the price distribution dashboard

use super::DashboardView;
use crate::pivot::{PivotGrid, PivotOutcome, PLACEHOLDER};
use crate::table::group_thousands;
use std::io::{self, Write};

pub const TITLE: &str = "🚘 국토부 데이터 가격 분포도";
pub const SUBTITLE: &str = "📊 2024년 국산 이전 데이터";
pub const NO_DATA: &str = "선택한 조건에 해당하는 데이터가 없습니다.";

pub fn write<W: Write>(writer: &mut W, view: &DashboardView) -> io::Result<()> {
    writer.write_all(page(view).as_bytes())
}

/// The complete dashboard document.
pub fn page(view: &DashboardView) -> String {
    let controls = if view.interactive {
        controls_form(view)
    } else {
        controls_summary(view)
    };

    let body = match &view.outcome {
        PivotOutcome::Grid(grid) => format!(
            r#"<div class="total">🚗 선택한 조건의 전체 차량 수: <b>{total} 대</b></div>
        <div class="unit">📌 단위: {unit}</div>
        <div class="table-container">
{table}
        </div>"#,
            total = group_thousands(grid.total_count.trunc() as i64),
            unit = escape(view.measure.unit()),
            table = table(grid),
        ),
        PivotOutcome::NoData => format!(r#"<div class="warning">⚠️ {}</div>"#, NO_DATA),
    };

    let footer = match &view.generated {
        Some(ts) => format!(r#"<div class="footer">Generated {}</div>"#, escape(ts)),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="ko">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        :root {{
            --bg: #ffffff;
            --card: #f6f8fa;
            --border: #d0d7de;
            --text: #1f2328;
            --dim: #656d76;
            --accent: #0969da;
            --warn-bg: #fff8c5;
            --warn: #9a6700;
        }}
        * {{ box-sizing: border-box; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans KR', 'Malgun Gothic', sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.5;
            margin: 0;
        }}
        .container {{ padding: 2rem; }}
        h1 {{ margin: 0 0 0.25rem 0; }}
        h2 {{ margin: 0 0 1.5rem 0; font-weight: 600; color: var(--dim); }}

        /* Controls */
        .controls {{
            display: flex;
            flex-wrap: wrap;
            gap: 1rem;
            align-items: flex-end;
            padding: 1rem;
            margin-bottom: 1.5rem;
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 8px;
        }}
        .control {{ display: flex; flex-direction: column; min-width: 160px; }}
        .control label {{ font-size: 0.8rem; color: var(--dim); margin-bottom: 0.25rem; }}
        .control select {{ padding: 0.4rem; font-size: 0.95rem; }}
        .control .value {{ font-weight: 600; }}
        .reset {{
            padding: 0.45rem 0.9rem;
            border: 1px solid var(--border);
            border-radius: 6px;
            color: var(--text);
            background: var(--bg);
            text-decoration: none;
        }}
        .reset:hover {{ border-color: var(--accent); color: var(--accent); }}

        .total {{ margin-bottom: 0.5rem; }}
        .unit {{ text-align: right; color: var(--dim); margin-bottom: 0.5rem; }}
        .warning {{
            padding: 1rem;
            border-radius: 8px;
            background: var(--warn-bg);
            color: var(--warn);
        }}

        /* Table */
        .table-container {{ overflow-x: auto; }}
        table.pricegrid {{ border-collapse: collapse; font-size: 0.85rem; }}
        table.pricegrid th, table.pricegrid td {{
            border: 1px solid var(--border);
            padding: 0.4rem 0.6rem;
            text-align: center;
            white-space: nowrap;
        }}
        table.pricegrid th {{ background: var(--card); }}
        table.pricegrid td.label {{ font-weight: 600; text-align: left; }}
        table.pricegrid td.empty {{ color: var(--dim); }}

        .notes {{ margin-top: 1.5rem; color: var(--dim); font-size: 0.875rem; }}
        .footer {{ margin-top: 2rem; color: var(--dim); font-size: 0.8rem; text-align: center; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
        <h2>{subtitle}</h2>

        {controls}

        {body}

        <div class="notes">
            <p>각 칸은 <b>평균</b>, (최저 ~ 최고), [거래 건수] 순서로 표시됩니다. 여러 집계 행이 같은 칸에 해당하면 각 통계의 평균을 보여줍니다.</p>
            <p>'{placeholder}' 표시는 해당 연식·주행거리 구간에 통계가 없거나 일부 값이 비어 있음을 뜻합니다.</p>
            <p>데이터 구분은 이상치 제외 기준(예: 하위 20/30/40% 제외)에 따라 집계된 파일을 선택합니다.</p>
        </div>
        {footer}
    </div>
</body>
</html>
"#,
        title = TITLE,
        subtitle = SUBTITLE,
        controls = controls,
        body = body,
        placeholder = PLACEHOLDER,
        footer = footer,
    )
}

/// The pivot table. Label and header text is escaped; statistic cells are
/// pre-formatted markup and go out verbatim.
pub fn table(grid: &PivotGrid) -> String {
    let mut out = String::from("<table class=\"pricegrid\">\n<thead>\n<tr>");
    for h in grid.header() {
        out.push_str(&format!("<th>{}</th>", escape(h)));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in &grid.rows {
        out.push_str("<tr>");
        for label in [&row.maker, &row.model, &row.mileage] {
            out.push_str(&format!("<td class=\"label\">{}</td>", escape(label)));
        }
        for cell in &row.cells {
            if cell == PLACEHOLDER {
                out.push_str(&format!("<td class=\"empty\">{}</td>", cell));
            } else {
                out.push_str(&format!("<td>{}</td>", cell));
            }
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</tbody>\n</table>");
    out
}

fn controls_form(view: &DashboardView) -> String {
    let mut fields = Vec::new();

    if !view.datasets.is_empty() {
        let options: Vec<(String, String)> = view
            .datasets
            .iter()
            .enumerate()
            .map(|(i, label)| (i.to_string(), label.clone()))
            .collect();
        let active = view.dataset.to_string();
        fields.push(select("tier", "데이터 구분", &options, Some(active.as_str()), None));
    }

    if view.measures.len() > 1 {
        let options: Vec<(String, String)> = view
            .measures
            .iter()
            .map(|m| (m.as_str().to_string(), m.label().to_string()))
            .collect();
        fields.push(select("measure", "통계", &options, Some(view.measure.as_str()), None));
    } else {
        fields.push(format!(
            r#"<input type="hidden" name="measure" value="{}">"#,
            view.measure.as_str()
        ));
    }

    fields.push(select(
        "maker",
        "제조사",
        &pairs(&view.choices.makers),
        view.selection.maker.as_deref(),
        Some("제조사 선택"),
    ));
    fields.push(select(
        "model",
        "모델명",
        &pairs(&view.choices.models),
        view.selection.model.as_deref(),
        Some("모델 선택"),
    ));
    for (name, value) in [
        ("prev_maker", &view.selection.maker),
        ("prev_model", &view.selection.model),
    ] {
        if let Some(value) = value {
            fields.push(format!(
                r#"<input type="hidden" name="{}" value="{}">"#,
                name,
                escape(value)
            ));
        }
    }
    fields.push(select(
        "fuel",
        "연료",
        &pairs(&view.choices.fuels),
        view.selection.fuel.as_deref(),
        Some("연료 선택"),
    ));

    format!(
        r#"<form class="controls" method="get" action="/">
            {fields}
            <a class="reset" href="/reset?tier={tier}&amp;measure={measure}">🔄 선택 초기화</a>
        </form>
        <script>
        // A changed picker invalidates every picker below it
        function cascade(el) {{
            const order = ['maker', 'model', 'fuel'];
            const i = order.indexOf(el.name);
            if (i >= 0) {{
                order.slice(i + 1).forEach(name => {{
                    const child = el.form.elements[name];
                    if (child) child.value = '';
                }});
            }}
            el.form.submit();
        }}
        </script>"#,
        fields = fields.join("\n            "),
        tier = view.dataset,
        measure = view.measure.as_str(),
    )
}

fn pairs(values: &[String]) -> Vec<(String, String)> {
    values.iter().map(|v| (v.clone(), v.clone())).collect()
}

fn controls_summary(view: &DashboardView) -> String {
    let mut items = Vec::new();
    if let Some(tier) = view.datasets.get(view.dataset) {
        items.push(("데이터 구분", tier.as_str()));
    }
    items.push(("통계", view.measure.label()));
    items.push(("제조사", view.selection.maker.as_deref().unwrap_or(PLACEHOLDER)));
    items.push(("모델명", view.selection.model.as_deref().unwrap_or(PLACEHOLDER)));
    items.push(("연료", view.selection.fuel.as_deref().unwrap_or(PLACEHOLDER)));

    let fields: Vec<String> = items
        .into_iter()
        .map(|(label, value)| {
            format!(
                r#"<div class="control"><label>{}</label><span class="value">{}</span></div>"#,
                label,
                escape(value)
            )
        })
        .collect();
    format!(r#"<div class="controls">{}</div>"#, fields.join(""))
}

fn select(
    name: &str,
    label: &str,
    options: &[(String, String)],
    selected: Option<&str>,
    placeholder: Option<&str>,
) -> String {
    let mut out = format!(
        r#"<div class="control"><label for="{name}">{label}</label><select id="{name}" name="{name}" onchange="cascade(this)">"#,
        name = name,
        label = label,
    );
    if let Some(text) = placeholder {
        let mark = if selected.is_none() { " selected" } else { "" };
        out.push_str(&format!(r#"<option value=""{}>{}</option>"#, mark, escape(text)));
    }
    for (value, text) in options {
        let mark = if selected == Some(value.as_str()) { " selected" } else { "" };
        out.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            escape(value),
            mark,
            escape(text)
        ));
    }
    out.push_str("</select></div>");
    out
}

/// Escape text for element content and double-quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
