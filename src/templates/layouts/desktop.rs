use maud::{html, Markup, PreEscaped, DOCTYPE};

const STYLE: &str = r#"
body { font-family: 'Segoe UI', sans-serif; background-color: #f3f4f6; color: #1f2937; margin: 0; padding: 20px; }
h1 { text-align: center; color: #db2777; margin-bottom: 20px; }
.status-bar { text-align: center; color: #6b7280; margin-bottom: 40px; font-size: 0.9em; }
.poi-section { margin: 40px auto; max-width: 1200px; }
.poi-title { font-size: 1.5em; color: #4b5563; border-left: 5px solid #db2777; font-weight: bold; background: white; padding: 10px 15px; border-radius: 0 8px 8px 0; box-shadow: 0 1px 3px rgba(0,0,0,0.1); margin-bottom: 20px; }
.container { display: grid; grid-template-columns: repeat(auto-fill, minmax(300px, 1fr)); gap: 25px; }
.card { background: white; border-radius: 12px; overflow: hidden; box-shadow: 0 4px 6px rgba(0,0,0,0.1); display: flex; flex-direction: column; }
.card img { width: 100%; height: 200px; object-fit: cover; }
.card-content { padding: 20px; flex-grow: 1; display: flex; flex-direction: column; }
.source-badge { font-size: 0.75em; text-transform: uppercase; font-weight: bold; color: #9ca3af; margin-bottom: 5px; }
.price { font-size: 1.5em; color: #be185d; font-weight: 800; margin-bottom: 5px; }
.address { color: #4b5563; font-size: 1.1em; line-height: 1.4; margin-bottom: 15px; }
.dist-badge { align-self: flex-start; background: #e0f2fe; color: #0369a1; padding: 4px 10px; border-radius: 20px; font-size: 0.85em; font-weight: 600; margin-bottom: 15px; }
.closest { color: #64748b; font-size: 0.85em; margin: -8px 0 15px; }
.actions { margin-top: auto; display: grid; grid-template-columns: 1fr 1fr; gap: 10px; }
.btn { padding: 10px; text-align: center; text-decoration: none; border-radius: 6px; font-weight: 600; font-size: 0.9em; }
.btn-view { background: #f3f4f6; color: #374151; }
.btn-wa { background: #22c55e; color: white; }
.empty { text-align: center; padding: 50px; color: #666; }
"#;

pub fn desktop_layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                (content)
            }
        }
    }
}
