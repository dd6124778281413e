use crate::error::Result;
use crate::models::AdParameters;
use clap::ValueEnum;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use url::Url;

/// The creative layouts this crate can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CreativeKind {
    /// An image banner wrapped in the click-through link
    #[default]
    Banner,
    /// Title, description and destination host on a translucent bar
    #[value(name = "text")]
    TextOverlay,
}

/// Rendered creative, ready to be mounted in the ad slot
#[derive(Debug, Clone, PartialEq)]
pub struct Creative {
    pub kind: CreativeKind,

    /// Markup fragment for the slot
    pub markup: String,

    /// The validated click-through destination, if any
    pub click_through: Option<Url>,
}

/// Value of `data-action` on the element that hands over to linear playback
pub const LINEAR_ACTION: &str = "linear";

/// Value of `data-action` on the click-through element
pub const CLICK_THRU_ACTION: &str = "click-thru";

/// Render the creative markup for `params`
pub fn render(kind: CreativeKind, params: &AdParameters) -> Result<Creative> {
    let click_through = params.gourl.as_deref().and_then(|raw| match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            log::warn!("Ignoring invalid click-through URL {:?}: {}", raw, e);
            None
        }
    });

    let markup = match kind {
        CreativeKind::Banner => banner_markup(params)?,
        CreativeKind::TextOverlay => text_overlay_markup(params, click_through.as_ref())?,
    };

    Ok(Creative {
        kind,
        markup,
        click_through,
    })
}

struct MarkupWriter {
    writer: Writer<Vec<u8>>,
}

impl MarkupWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn open(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(tag).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Start(start))?;
        Ok(())
    }

    fn close(&mut self, tag: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    fn empty(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(tag).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Empty(start))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn finish(self) -> String {
        String::from_utf8_lossy(&self.writer.into_inner()).into_owned()
    }
}

fn linear_button(out: &mut MarkupWriter) -> Result<()> {
    out.open("div", &[("class", "vpaid-overlay")])?;
    out.open(
        "button",
        &[
            ("class", "vpaid-linear-button"),
            ("data-action", LINEAR_ACTION),
            ("aria-label", "Close"),
        ],
    )?;
    out.text("\u{00d7}")?;
    out.close("button")?;
    out.close("div")
}

fn banner_markup(params: &AdParameters) -> Result<String> {
    let href = params.gourl.as_deref().unwrap_or_default();
    let image = params
        .first_overlay()
        .and_then(|overlay| overlay.image())
        .unwrap_or_default();

    let mut out = MarkupWriter::new();
    out.open("div", &[("class", "vpaid-nonlinear vpaid-banner")])?;
    out.open("div", &[("class", "vpaid-box")])?;
    out.open("div", &[("class", "vpaid-container")])?;

    out.open("a", &[("href", href), ("data-action", CLICK_THRU_ACTION)])?;
    out.empty("img", &[("id", "banner-fais"), ("src", image)])?;
    out.close("a")?;

    linear_button(&mut out)?;

    out.close("div")?;
    out.close("div")?;
    out.close("div")?;
    Ok(out.finish())
}

fn text_overlay_markup(params: &AdParameters, click_through: Option<&Url>) -> Result<String> {
    let href = params.gourl.as_deref().unwrap_or_default();
    let overlay = params.first_overlay();
    let title = overlay.and_then(|o| o.title()).unwrap_or_default();
    let description = overlay.and_then(|o| o.description()).unwrap_or_default();
    // Unparseable destinations show as given
    let host = click_through
        .and_then(|url| url.host_str())
        .unwrap_or(href);

    let mut out = MarkupWriter::new();
    out.open("div", &[("class", "vpaid-nonlinear vpaid-text")])?;
    out.open("div", &[("class", "vpaid-box")])?;
    out.open("div", &[("class", "vpaid-text-frame")])?;
    out.open("div", &[("class", "vpaid-text-body")])?;
    out.open("div", &[("class", "vpaid-container")])?;

    out.open(
        "a",
        &[
            ("class", "vpaid-title"),
            ("href", href),
            ("data-action", CLICK_THRU_ACTION),
        ],
    )?;
    out.text(title)?;
    out.close("a")?;

    out.open("div", &[("class", "vpaid-description")])?;
    out.text(description)?;
    out.close("div")?;

    out.open("a", &[("class", "vpaid-host"), ("href", href)])?;
    out.text(host)?;
    out.close("a")?;

    out.close("div")?;
    out.close("div")?;

    linear_button(&mut out)?;

    out.close("div")?;
    out.close("div")?;
    out.close("div")?;
    Ok(out.finish())
}
