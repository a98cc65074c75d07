use crate::stats::{CategoryView, Dashboard};

pub fn render_dashboard(user_id: &str, dashboard: &Dashboard) -> String {
    let stats = &dashboard.stats;
    let categories: String = dashboard.categories.iter().map(render_category).collect();
    DASHBOARD_HTML
        .replace("{{USER}}", &escape_html(user_id))
        .replace("{{DATE}}", &dashboard.date)
        .replace("{{BALANCE}}", &stats.balance.to_string())
        .replace("{{EARNED}}", &stats.total_earned.to_string())
        .replace("{{REMAINING}}", &stats.total_remaining.to_string())
        .replace("{{COMPLETED}}", &stats.completed_count.to_string())
        .replace("{{TOTAL}}", &stats.total_activities.to_string())
        .replace("{{PROGRESS}}", &stats.progress_percentage.to_string())
        .replace("{{VIP_CHECKED}}", if stats.vip { "checked" } else { "" })
        .replace("{{EVENT_HIDDEN}}", if stats.event_active { "" } else { "hidden" })
        .replace("{{CATEGORIES}}", &categories)
}

fn render_category(category: &CategoryView) -> String {
    let items: String = category
        .activities
        .iter()
        .map(|activity| {
            format!(
                r#"<li class="activity{done}">
          <label>
            <input type="checkbox" data-activity="{id}" {checked} />
            <span class="name">{name}</span>
            <span class="bp" data-bp-for="{id}">{bp}</span>
          </label>
        </li>
"#,
                done = if activity.completed { " done" } else { "" },
                id = escape_html(&activity.id),
                checked = if activity.completed { "checked" } else { "" },
                name = escape_html(&activity.name),
                bp = activity.bp_value,
            )
        })
        .collect();
    format!(
        "<section class=\"category\">\n      <h2>{}</h2>\n      <ul>\n{items}      </ul>\n    </section>\n",
        escape_html(&category.name)
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Bonus Points</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .stat .label {
      display: block;
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      display: block;
      font-size: 1.7rem;
      font-weight: 600;
    }

    .event {
      background: var(--accent);
      color: white;
      border-radius: 14px;
      padding: 10px 16px;
    }

    .controls {
      display: flex;
      flex-wrap: wrap;
      gap: 16px;
      align-items: center;
    }

    ul {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 8px;
    }

    .activity label {
      display: grid;
      grid-template-columns: auto 1fr auto;
      gap: 12px;
      align-items: center;
      background: white;
      border-radius: 12px;
      padding: 10px 14px;
    }

    .activity.done .name {
      text-decoration: line-through;
      color: #8b857d;
    }

    .bp {
      font-weight: 600;
      color: var(--accent-2);
    }

    .error {
      color: var(--accent);
      min-height: 1.2em;
    }
  </style>
</head>
<body>
  <main class="app" data-user="{{USER}}">
    <header>
      <h1>Bonus Points</h1>
      <p>Activity day {{DATE}}</p>
      <p class="event" {{EVENT_HIDDEN}}>x2 BP event is active!</p>
    </header>

    <section class="panel">
      <div class="stat"><span class="label">Balance</span><span class="value" id="balance">{{BALANCE}}</span></div>
      <div class="stat"><span class="label">Earned today</span><span class="value" id="earned">{{EARNED}}</span></div>
      <div class="stat"><span class="label">Remaining</span><span class="value" id="remaining">{{REMAINING}}</span></div>
      <div class="stat"><span class="label">Progress</span><span class="value"><span id="completed">{{COMPLETED}}</span>/<span id="total">{{TOTAL}}</span> (<span id="progress">{{PROGRESS}}</span>%)</span></div>
    </section>

    <section class="controls">
      <label><input type="checkbox" id="vip" {{VIP_CHECKED}} /> VIP</label>
      <form id="balance-form">
        <input type="number" id="balance-input" min="0" max="1000000" placeholder="Set balance" />
        <button type="submit">Save</button>
      </form>
      <span class="error" id="error"></span>
    </section>

    {{CATEGORIES}}
  </main>

  <script>
    const userId = document.querySelector('.app').dataset.user;
    const errorEl = document.getElementById('error');

    const api = async (path, payload) => {
      const options = { headers: { 'X-User-Id': userId } };
      if (payload !== undefined) {
        options.method = 'POST';
        options.headers['Content-Type'] = 'application/json';
        options.body = JSON.stringify(payload);
      }
      const response = await fetch(path, options);
      const data = await response.json();
      if (!response.ok) {
        throw new Error(data.error || 'Request failed');
      }
      return data;
    };

    const refreshStats = async () => {
      const stats = await api('/api/user_stats');
      document.getElementById('balance').textContent = stats.balance;
      document.getElementById('earned').textContent = stats.total_earned;
      document.getElementById('remaining').textContent = stats.total_remaining;
      document.getElementById('completed').textContent = stats.completed_count;
      document.getElementById('total').textContent = stats.total_activities;
      document.getElementById('progress').textContent = stats.progress_percentage;
    };

    const refreshBpValues = async () => {
      const values = await api('/api/activity_bp_values');
      Object.entries(values.activities).forEach(([id, bp]) => {
        const el = document.querySelector(`[data-bp-for="${id}"]`);
        if (el) {
          el.textContent = bp;
        }
      });
    };

    const run = async (action) => {
      errorEl.textContent = '';
      try {
        await action();
      } catch (err) {
        errorEl.textContent = err.message;
      }
    };

    document.querySelectorAll('[data-activity]').forEach((box) => {
      box.addEventListener('change', () => run(async () => {
        box.disabled = true;
        try {
          await api('/api/toggle_activity', { activity_id: box.dataset.activity, completed: box.checked });
          box.closest('.activity').classList.toggle('done', box.checked);
          await refreshStats();
        } catch (err) {
          box.checked = !box.checked;
          throw err;
        } finally {
          box.disabled = false;
        }
      }));
    });

    document.getElementById('vip').addEventListener('change', (event) => run(async () => {
      await api('/api/toggle_vip', { vip_status: event.target.checked });
      await refreshBpValues();
      await refreshStats();
    }));

    document.getElementById('balance-form').addEventListener('submit', (event) => {
      event.preventDefault();
      const amount = Number.parseInt(document.getElementById('balance-input').value, 10);
      run(async () => {
        await api('/api/set_balance', { amount });
        await refreshStats();
      });
    });
  </script>
</body>
</html>
"#;
