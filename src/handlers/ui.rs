// src/handlers/ui.rs - Single-page front end: form, trigger, progress poller
use axum::{response::Html, routing::get, Router};

pub fn ui_routes() -> Router {
    Router::new().route("/", get(index_page))
}

async fn index_page() -> Html<String> {
    let html = r###"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Playlist Scraper</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 720px; margin: 0 auto; padding: 20px; line-height: 1.6; }
        .header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 2rem; border-radius: 10px; margin-bottom: 2rem; }
        label { display: block; font-weight: 600; margin-top: 1rem; }
        input[type=text], textarea { width: 100%; padding: 0.5rem; border: 1px solid #ced4da; border-radius: 5px; box-sizing: border-box; }
        textarea { height: 6rem; }
        .hint { color: #6c757d; font-size: 0.85rem; }
        button { margin-top: 1.5rem; background: #007bff; color: white; border: none; padding: 0.6rem 1.5rem; border-radius: 5px; font-size: 1rem; cursor: pointer; }
        button:disabled { background: #6c757d; cursor: not-allowed; }
        .progress-wrap { margin-top: 2rem; display: none; }
        .progress-bar { background: #e9ecef; border-radius: 5px; overflow: hidden; height: 1.4rem; }
        .progress-fill { background: #28a745; height: 100%; width: 0%; transition: width 0.3s; }
        #status-message { margin-top: 0.5rem; }
        .error { color: #dc3545; }
    </style>
</head>
<body>
    <div class="header">
        <h1>Playlist Scraper</h1>
        <p>Export YouTube playlist metadata (title, description, duration) to CSV</p>
    </div>

    <form id="scrape-form">
        <label for="channel">Channel handle</label>
        <input type="text" id="channel" placeholder="@3blue1brown">
        <div class="hint">All public playlists of this channel will be exported.</div>

        <label for="playlists">Playlist URLs (one per line)</label>
        <textarea id="playlists" placeholder="https://www.youtube.com/playlist?list=..."></textarea>

        <label><input type="checkbox" id="split"> One CSV file per playlist</label>

        <button type="submit" id="start-btn">Start download</button>
    </form>

    <div class="progress-wrap" id="progress-wrap">
        <div class="progress-bar"><div class="progress-fill" id="progress-fill"></div></div>
        <div id="status-message"></div>
        <div id="playlist-counter" class="hint"></div>
    </div>

    <script>
        const form = document.getElementById('scrape-form');
        const startBtn = document.getElementById('start-btn');
        let pollTimer = null;

        form.addEventListener('submit', async (e) => {
            e.preventDefault();
            const channel = document.getElementById('channel').value.trim();
            const playlists = document.getElementById('playlists').value
                .split('\n').map(s => s.trim()).filter(s => s.length > 0);
            const split = document.getElementById('split').checked;

            const resp = await fetch('/download', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ channel: channel || null, playlists, split }),
            });
            const body = await resp.json();
            const messageEl = document.getElementById('status-message');
            document.getElementById('progress-wrap').style.display = 'block';

            if (!resp.ok) {
                messageEl.textContent = body.error;
                messageEl.classList.add('error');
                return;
            }

            messageEl.classList.remove('error');
            messageEl.textContent = body.message;
            startBtn.disabled = true;
            pollTimer = setInterval(poll, 1000);
        });

        async function poll() {
            const resp = await fetch('/progress');
            const state = await resp.json();

            document.getElementById('progress-fill').style.width = state.progress + '%';
            const messageEl = document.getElementById('status-message');
            messageEl.textContent = state.message;
            messageEl.classList.toggle('error', state.status === 'error');

            const counter = document.getElementById('playlist-counter');
            if (state.total_playlists > 0) {
                counter.textContent = 'Playlists: ' + state.processed_playlists + '/' +
                    state.total_playlists +
                    (state.current_playlist ? ' - ' + state.current_playlist : '');
            }

            if (!state.is_running && state.status !== 'idle' && state.status !== 'in_progress') {
                clearInterval(pollTimer);
                startBtn.disabled = false;
            }
        }
    </script>
</body>
</html>
    "###;

    Html(html.to_string())
}
