//! Prompt templates for the generation stages.
//!
//! Only abstract style tags and photo descriptions are ever interpolated.
//! Names, dates, locations, story text and URLs never appear in a prompt.

use pipeline::{PhotoMetadata, Preferences, VisualStyle};
use serde_json::json;

pub const PLANNER_SYSTEM: &str = r#"You are a Creative Director for luxury events.
Your task is to analyze the user's preferences and produce a structured "Brand Design Plan" for a wedding invitation website.

Input Data:
- Preferences: explicit choices (style, color, layout).

Output Schema (JSON):
{
  "visual_style": {
    "theme": "string (e.g. 'Retro Cinema', 'Garden Party')",
    "primary_color": "hex string",
    "font_family": "string (css font family)",
    "layout": "string (e.g. 'single-page-scroll')"
  }
}

Focus ONLY on the visual style and layout structure. Do NOT include any content placeholders.
Reply with the JSON object only."#;

/// User message for the planner. `bgm_url` is never included.
pub fn planner_user(prefs: &Preferences) -> String {
    let tags = json!({
        "style": prefs.style,
        "primary_color": prefs.primary_color,
        "page_format": prefs.page_format,
    });
    format!("Preferences: {tags}\n\nGenerate the Brand Design Plan JSON.")
}

/// System prompt for the coder, with the style decisions filled in.
pub fn coder_system(style: &VisualStyle, photo_count: usize, wants_music: bool) -> String {
    let audio = if wants_music {
        "- Audio: background music IS requested. Create an audio player (an <audio> element or `new Audio(...)`) \
         that plays `bgmUrl` from the API data, with a visible mute/unmute toggle."
    } else {
        "- Audio: if `bgmUrl` is present in the API data, create a hidden audio player dynamically."
    };

    format!(
        r#"You are an expert Frontend Architect specializing in high-end wedding invitations.
Your goal is to generate a dynamic HTML5 template using Tailwind CSS (via CDN).

CRITICAL SECURITY REQUIREMENT:
- DO NOT hardcode any user data (names, dates, locations, photos) in the HTML.
- The HTML must fetch data dynamically from an API at runtime.

Technical Specs:
1. Single .html file.
2. Use Tailwind CSS: <script src="https://cdn.tailwindcss.com"></script>
3. Visual Style: {theme} | Primary Color: {color} | Font: {font} | Layout: {layout}
4. Dynamic Data Fetching:
   - Assume a global variable `window.PROJECT_ID` is available.
   - On load, fetch data from `/api/v1/projects/${{window.PROJECT_ID}}`.
   - The API returns a JSON object with: `theme`, `color`, `groomName`, `brideName`, `date`, `location`,
     `coordinates`, `bgmUrl`, `guestMessage`, `photos` (list of {{url, description}}).
   - Use JavaScript to populate the DOM elements.

Photo Layout Logic:
- You have a list of available photos with their descriptions (but NO URLs).
- Design a grid or layout that fits the content (e.g. a photo described as "wide shot" gets a full-width container).
- Render `<img>` tags with a `data-photo-index="i"` attribute, where i is the index from 0.
- Leave `src` empty. In JavaScript, bind `data.photos[i].url` to each indexed image and hide images with no photo.

Layout Requirements:
- Header: display both names.
- Hero Section: date and location.
- Story/Message: display `guestMessage` if present.
- Gallery: pre-render the layout for the {photo_count} photos provided.
{audio}

Output ONLY raw HTML code."#,
        theme = style.theme,
        color = style.primary_color,
        font = style.font_family,
        layout = style.layout,
    )
}

/// User message for the coder: style summary plus indexed photo descriptions.
pub fn coder_user(style: &VisualStyle, photos: &[PhotoMetadata]) -> String {
    let mut msg = format!(
        "Visual Style:\nTheme: {}\nColor: {}\nFont: {}\nLayout: {}\n",
        style.theme, style.primary_color, style.font_family, style.layout
    );
    if !photos.is_empty() {
        msg.push_str("\nPhotos available (layout guidance only):");
        for (i, photo) in photos.iter().enumerate() {
            let desc = photo
                .description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or("No description");
            msg.push_str(&format!("\n- Index {i}: {desc}"));
        }
        msg.push('\n');
    }
    msg.push_str("\nGenerate the dynamic HTML template now.");
    msg
}
