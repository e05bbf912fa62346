use crate::table::{Column, PermissionRecord, ReportSummary};

fn json_for_script_tag(value: &str) -> String {
    value.replace("</", "<\\/")
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn summary_line(summary: Option<&ReportSummary>, rows: usize) -> String {
    let mut parts = vec![format!("{rows} permission rows")];
    if let Some(s) = summary {
        if let Some(site) = s.site.as_deref() {
            parts.push(format!("site {site}"));
        }
        if let Some(n) = s.total_nodes {
            parts.push(format!("{n} nodes"));
        }
        if let (Some(u), Some(g)) = (s.user_permissions, s.group_permissions) {
            parts.push(format!("{u} direct / {g} group grants"));
        }
    }
    escape_html(&parts.join(" · "))
}

/// Standalone report page. Rows are embedded as JSON and the table sorts
/// client-side with the same rules as the terminal view.
pub fn render_html(records: &[PermissionRecord], summary: Option<&ReportSummary>) -> Vec<u8> {
    let json = serde_json::to_string(records).unwrap_or_else(|_| "[]".to_string());
    let json = json_for_script_tag(&json);
    let columns: Vec<_> = Column::ALL
        .iter()
        .map(|c| format!("[\"{}\",\"{}\"]", c.key(), c.label()))
        .collect();
    let columns = columns.join(",");
    let summary = summary_line(summary, records.len());

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Direct Permissions Report</title>
  <script src="https://cdn.tailwindcss.com?plugins=forms"></script>
  <style>
    th {{ cursor: pointer; position: sticky; top: 0; white-space: nowrap; }}
    td {{ white-space: pre-wrap; vertical-align: top; }}
  </style>
</head>
<body class="bg-slate-50 text-slate-900 min-h-screen">
  <script type="application/json" id="records-data">{json}</script>
  <main class="max-w-[1440px] mx-auto w-full px-8 py-10">
    <h1 class="text-3xl font-bold mb-2">Direct Permissions</h1>
    <p class="text-sm text-slate-500 mb-6">{summary}</p>
    <div class="bg-white rounded-xl shadow-sm overflow-auto p-4">
      <table id="report" class="w-full text-left border-collapse text-sm">
        <thead><tr id="report-head" class="bg-slate-50 border-b-2 border-slate-200"></tr></thead>
        <tbody id="report-body"></tbody>
      </table>
    </div>
  </main>
  <script>
    (function() {{
      const columns = [{columns}];
      const rows = JSON.parse(document.getElementById('records-data').textContent || '[]');
      const head = document.getElementById('report-head');
      const body = document.getElementById('report-body');
      let sort = null;

      function cell(row, key) {{
        return row[key] == null ? '' : String(row[key]);
      }}

      function compare(a, b) {{
        const ta = a.trim(), tb = b.trim();
        const na = Number(ta), nb = Number(tb);
        if (ta !== '' && tb !== '' && isFinite(na) && isFinite(nb)) return na - nb;
        return ta.localeCompare(tb, undefined, {{ numeric: true, sensitivity: 'base' }});
      }}

      function render() {{
        head.innerHTML = '';
        columns.forEach(function(col) {{
          const th = document.createElement('th');
          const arrow = sort && sort.key === col[0] ? (sort.asc ? ' ▲' : ' ▼') : '';
          th.textContent = col[1] + arrow;
          th.className = 'px-3 py-2';
          th.addEventListener('click', function() {{
            sort = sort && sort.key === col[0] ? {{ key: col[0], asc: !sort.asc }} : {{ key: col[0], asc: true }};
            rows.sort(function(a, b) {{
              const o = compare(cell(a, sort.key), cell(b, sort.key));
              return sort.asc ? o : -o;
            }});
            render();
          }});
          head.appendChild(th);
        }});

        body.innerHTML = '';
        if (rows.length === 0) {{
          const tr = document.createElement('tr');
          const td = document.createElement('td');
          td.colSpan = columns.length;
          td.className = 'px-3 py-6 text-center text-slate-500';
          td.textContent = 'No permissions to display.';
          tr.appendChild(td);
          body.appendChild(tr);
          return;
        }}
        rows.forEach(function(row, idx) {{
          const tr = document.createElement('tr');
          tr.className = (idx % 2 === 0 ? 'bg-white' : 'bg-slate-50') + ' border-b border-slate-100';
          columns.forEach(function(col) {{
            const td = document.createElement('td');
            td.className = 'px-3 py-2';
            td.textContent = cell(row, col[0]);
            tr.appendChild(td);
          }});
          if (row.nodeRef) {{
            tr.title = row.nodeRef;
            tr.addEventListener('click', function() {{
              if (navigator.clipboard) navigator.clipboard.writeText(row.nodeRef).catch(function() {{}});
            }});
          }}
          body.appendChild(tr);
        }});
      }}

      render();
    }})();
  </script>
</body>
</html>
"####
    );
    html.into_bytes()
}
