use crate::model::{Style, TargetDuration};
use serde_json::{Value, json};

/// Topics containing any of these get the health/medical compliance notice.
pub const SENSITIVE_KEYWORDS: &[&str] = &["衛教", "醫藥", "健康", "法規"];

pub const COMPLIANCE_HEADING: &str = "**特別注意事項：**";

const COMPLIANCE_NOTICE: &str = "\
    **特別注意事項：**
    由於主題涉及健康或醫療教育，所有內容（特別是「口白文字腳本」）都必須嚴格遵守台灣的醫藥衛生法規。
    - **禁止** 宣稱療效或誇大不實的效果。
    - 內容應基於科學事實，語氣客觀、中立。
    - 避免使用「治癒」、「保證」、「根治」、「最強」等絕對性或最高級詞語。
    - 若提及特定產品，僅能陳述一般性用途或產品資訊，不得涉及醫療效能。
    - 腳本結尾強烈建議加入「請諮詢專業醫師或藥師」等警語。
";

/// Named starting points for a topic; the bracketed part is meant to be filled in.
pub const TEMPLATES: &[(&str, &str)] = &[
    ("短影音", "為 [請填寫主題] 製作一支30秒的短影音，風格需快節奏、引人注目。"),
    ("活動記錄", "為 [請填寫活動名稱] 製作一支精彩的活動回顧影片，捕捉活動亮點與氣氛。"),
    ("公司形象", "製作一支60秒的公司形象影片，介紹 [請填寫公司名稱] 的核心價值與願景。"),
    ("產品開箱", "為新產品 [請填寫產品名稱] 製作一支詳細的開箱評測影片，展示其特色與使用方式。"),
    ("作業流程", "製作一支教學影片，詳細解說 [請填寫作業流程名稱] 的每一個步驟。"),
    ("操作手冊", "將 [請填寫產品/軟體名稱] 的操作手冊影片化，讓使用者能快速上手。"),
    ("街頭調查", "針對 [請填寫調查主題] 進行街頭訪問，剪輯成一支有趣的調查報告影片。"),
    ("教學影片", "製作一支關於 [請填寫教學主題] 的教學影片，內容需深入淺出、易於理解。"),
    ("衛教影片", "製作一支關於 [請填寫衛教主題] 的衛教影片，內容須符合台灣醫藥衛生法規，避免誇大不實或宣稱療效。"),
    ("廣告短片", "為 [請填寫產品/服務] 設計一則15秒的創意廣告短片。"),
    ("幕後花絮", "拍攝 [請填寫專案/活動名稱] 的幕後花絮，展現團隊合作與有趣時刻。"),
];

pub fn template(name: &str) -> Option<&'static str> {
    TEMPLATES
        .iter()
        .find(|(n, _)| *n == name.trim())
        .map(|(_, prompt)| *prompt)
}

/// Case-sensitive substring match, as the keywords are authored.
pub fn needs_compliance_notice(topic: &str) -> bool {
    SENSITIVE_KEYWORDS.iter().any(|k| topic.contains(k))
}

pub fn build_prompt(topic: &str, duration: TargetDuration, style: Style) -> String {
    let notice = if needs_compliance_notice(topic) {
        COMPLIANCE_NOTICE
    } else {
        ""
    };
    let duration = duration.label();
    let style = style.label();

    format!(
        "
    你是一位專業的影片製作人與AI腳本家，同時也是一位嚴謹的醫藥法規專家。
    你的任務是根據使用者提供的主題，為一個總長度約為{duration}的影片（例如 YouTube Short, TikTok, 或 Instagram Reel）生成一個完整的影片腳本。
    使用者提供的主題是：「{topic}」。
    影片的整體風格應為「{style}」。

    {notice}

    請為這個主題生成一個【{style}】風格的腳本，總時長應接近{duration}。你可以自行決定場景數量以達到最佳的敘事節奏。
    你的輸出必須是嚴格的JSON格式，並完全符合提供的schema。

    對於每個場景，請提供以下八個欄位的內容：
    1.  scene (場景編號): 數字。
    2.  storyboard (分鏡腳本): 場景的視覺描述，包含鏡頭角度、設定和動作。請使用繁體中文。
    3.  voiceover (口白文字腳本): 場景的旁白或對話。請使用繁體中文。
    4.  imagePrompt (圖片生成提示詞): 一段詳細、電影感的英文提示詞，給AI圖片生成模型使用。
    5.  characterPrompt (人物生成提示詞): 一段詳細的英文提示詞，用於生成場景中的人物，注重外觀一致性。如果此場景沒有人物，請填寫 \"N/A\"。
    6.  veoPrompt (Veo影片生成提示詞): 一段詳細、描述動作的英文提示詞，給AI影片生成模型使用。
    7.  seconds (秒數): 這個場景的預估持續秒數。所有場景的秒數總和應接近{duration}。
    8.  music (音樂): 這個場景的背景音樂或音效描述。請使用繁體中文。

    請確保所有prompt都是英文，而腳本描述則是繁體中文。
    "
    )
}

/// Output schema handed to the provider, in its OpenAPI-subset dialect.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "videoType": {
                "type": "STRING",
                "description": "影片的類型 (例如: 廣告, 教學, 開箱)。"
            },
            "scenes": {
                "type": "ARRAY",
                "description": "影片的場景陣列。",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "scene": { "type": "INTEGER", "description": "場景編號。" },
                        "storyboard": {
                            "type": "STRING",
                            "description": "分鏡腳本：對這個場景的視覺描述，使用繁體中文。"
                        },
                        "voiceover": {
                            "type": "STRING",
                            "description": "口白文字腳本：這個場景的旁白或對話，使用繁體中文。"
                        },
                        "imagePrompt": {
                            "type": "STRING",
                            "description": "圖片生成提示詞：一個詳細的英文提示詞，用於AI圖片生成工具（如Imagen）來創造這個場景的靜態圖片。"
                        },
                        "characterPrompt": {
                            "type": "STRING",
                            "description": "人物生成提示詞：一個詳細的英文提示詞，用於生成場景中出現的人物。如果沒有人物，則返回 'N/A'。"
                        },
                        "veoPrompt": {
                            "type": "STRING",
                            "description": "Veo影片生成提示詞：一個詳細的英文提示詞，用於AI影片生成工具（如Veo）來創造這個場景的動態影片。"
                        },
                        "seconds": { "type": "INTEGER", "description": "場景的預估秒數。" },
                        "music": {
                            "type": "STRING",
                            "description": "場景的背景音樂或音效描述，使用繁體中文。"
                        }
                    },
                    "required": [
                        "scene", "storyboard", "voiceover", "imagePrompt",
                        "characterPrompt", "veoPrompt", "seconds", "music"
                    ]
                }
            }
        },
        "required": ["videoType", "scenes"]
    })
}
