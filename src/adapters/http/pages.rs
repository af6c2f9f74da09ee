use crate::domain::stream::StreamStatus;

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn stream_item(host: &str, stream: &StreamStatus) -> String {
    let state = match (stream.running, stream.segments) {
        (false, _) => String::from("stopped"),
        (true, 0) => String::from("starting"),
        (true, n) => format!("live, {} segments", n),
    };
    let video_id = escape(stream.video_id.as_str());

    format!(
        r#"
                <li>
                    {video_id} <small>({state})</small>
                    <button onclick="removeStream('{video_id}')">Remove</button>
                    <br>
                    <a href="http://{host}{link}">M3U8 Link</a>
                </li>"#,
        host = escape(host),
        link = escape(&stream.playlist_url_path()),
    )
}

/// Form to add a stream plus the list of registered streams.
pub fn index(host: &str, streams: &[StreamStatus]) -> String {
    let items = streams
        .iter()
        .map(|stream| stream_item(host, stream))
        .collect::<String>();

    format!(
        r#"
        <!doctype html>
        <html>
            <head>
                <title>Restream</title>
            </head>
            <body>
                <h1>Restream</h1>
                <form action="/add-stream" method="POST">
                    <input type="text" name="videoId" placeholder="YouTube Video ID" required>
                    <button type="submit">Add Stream</button>
                </form>
                <h2>Active Streams</h2>
                <ul>{}
                </ul>
                <script>
                    function removeStream(videoId) {{
                        fetch('/remove-stream', {{
                            method: 'POST',
                            headers: {{ 'Content-Type': 'application/json' }},
                            body: JSON.stringify({{ videoId }})
                        }}).then(() => location.reload());
                    }}
                </script>
            </body>
        </html>
        "#,
        items
    )
}
