//! Session markup builders

/// One backbone paragraph
pub enum Para<'a> {
    /// `<b><font>` styled paragraph (legacy speaker marker candidate)
    Marker(&'a str),
    /// Plain paragraph
    Text(&'a str),
    /// `mowca-link` paragraph with a named anchor
    Link { index: u32, text: &'a str },
}

fn render(paragraphs: &[Para<'_>]) -> String {
    paragraphs
        .iter()
        .map(|p| match p {
            Para::Marker(text) => format!("<P><B><FONT SIZE=\"+1\">{}</FONT></B></P>\n", text),
            Para::Text(text) => format!("<P>{}</P>\n", text),
            Para::Link { index, text } => format!(
                "<p class=\"mowca-link\"><a name=\"{}\">{}</a></p>\n",
                index, text
            ),
        })
        .collect()
}

pub fn legacy_backbone(paragraphs: &[Para<'_>]) -> String {
    format!("<HTML><BODY>\n{}</BODY></HTML>", render(paragraphs))
}

pub fn new_backbone(title: &str, paragraphs: &[Para<'_>]) -> String {
    format!(
        "<html><body>\n<h1>{}</h1>\n{}</body></html>",
        title,
        render(paragraphs)
    )
}

/// Speaker document with an `h2.mowca` heading
pub fn speaker_document(heading: &str, paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{}</p>\n", p)).collect();
    format!(
        "<html><body>\n<h2 class=\"mowca\">{}</h2>\n{}<h2>Następny punkt</h2>\n<p>Poza wypowiedzią</p>\n</body></html>",
        heading, body
    )
}
