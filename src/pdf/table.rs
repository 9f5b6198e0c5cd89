//! Grid tables: filled header, bordered body cells, wrapped text, and
//! page breaks that repeat the header.

use tracing::debug;

use super::layout::{
    line_height, wrap_text, Align, Canvas, DrawOp, FontStyle, RgbColor, Stroke,
    MARGIN, PAGE_HEIGHT, PT_TO_MM,
};

/// Lowest y a table row may reach before it moves to the next page.
pub const TABLE_BOTTOM: f32 = PAGE_HEIGHT - MARGIN;

const BODY_TEXT: RgbColor = RgbColor::grey(80);
const GRID_LINE: Stroke = Stroke {
    color: RgbColor::grey(200),
    width: 0.1,
};
const HEADER_SIZE: f32 = 11.0;

#[derive(Debug, Clone)]
pub struct Column {
    pub width: f32,
    pub align: Align,
    pub style: FontStyle,
    pub fill: Option<RgbColor>,
}

impl Column {
    pub fn new(width: f32) -> Self {
        Self {
            width,
            align: Align::Left,
            style: FontStyle::Regular,
            fill: None,
        }
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    /// Bold text on a filled background.
    pub fn label(mut self, fill: RgbColor) -> Self {
        self.style = FontStyle::Bold;
        self.fill = Some(fill);
        self
    }
}

#[derive(Debug, Clone)]
pub enum Header {
    /// One title per column, left aligned.
    Columns(Vec<String>),
    /// A single centred title spanning every column.
    Merged(String),
}

#[derive(Debug, Clone)]
pub struct Table {
    pub header: Header,
    pub header_fill: RgbColor,
    pub columns: Vec<Column>,
    pub font_size: f32,
    pub padding: f32,
    pub rows: Vec<Vec<String>>,
}

/// One laid-out row: wrapped lines per cell and the row height.
struct RowLayout {
    cells: Vec<Vec<String>>,
    height: f32,
}

impl Table {
    fn total_width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    fn row_height(&self, cells: &[Vec<String>], size: f32) -> f32 {
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        lines as f32 * line_height(size) + 2.0 * self.padding
    }

    fn layout_header(&self) -> RowLayout {
        let cells: Vec<Vec<String>> = match &self.header {
            Header::Merged(title) => {
                let inner = self.total_width() - 2.0 * self.padding;
                vec![wrap_text(title, inner, HEADER_SIZE, FontStyle::Bold)]
            }
            Header::Columns(titles) => self
                .columns
                .iter()
                .enumerate()
                .map(|(i, col)| {
                    let title = titles.get(i).map(String::as_str).unwrap_or("");
                    wrap_text(title, col.width - 2.0 * self.padding, HEADER_SIZE, FontStyle::Bold)
                })
                .collect(),
        };
        let height = self.row_height(&cells, HEADER_SIZE);
        RowLayout { cells, height }
    }

    fn layout_row(&self, row: &[String]) -> RowLayout {
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let text = row.get(i).map(String::as_str).unwrap_or("");
                wrap_text(text, col.width - 2.0 * self.padding, self.font_size, col.style)
            })
            .collect();
        let height = self.row_height(&cells, self.font_size);
        RowLayout { cells, height }
    }

    fn draw_header(&self, canvas: &mut Canvas, header: &RowLayout) {
        let top = canvas.y;
        match &self.header {
            Header::Merged(_) => {
                let width = self.total_width();
                canvas.push(DrawOp::Rect {
                    x: MARGIN,
                    y: top,
                    width,
                    height: header.height,
                    fill: Some(self.header_fill),
                    stroke: None,
                });
                self.draw_lines(
                    canvas,
                    &header.cells[0],
                    MARGIN,
                    width,
                    top,
                    Align::Center,
                    HEADER_SIZE,
                    FontStyle::Bold,
                    RgbColor::WHITE,
                );
            }
            Header::Columns(_) => {
                let mut x = MARGIN;
                for (col, lines) in self.columns.iter().zip(&header.cells) {
                    canvas.push(DrawOp::Rect {
                        x,
                        y: top,
                        width: col.width,
                        height: header.height,
                        fill: Some(self.header_fill),
                        stroke: None,
                    });
                    self.draw_lines(
                        canvas,
                        lines,
                        x,
                        col.width,
                        top,
                        Align::Left,
                        HEADER_SIZE,
                        FontStyle::Bold,
                        RgbColor::WHITE,
                    );
                    x += col.width;
                }
            }
        }
        canvas.y = top + header.height;
    }

    fn draw_row(&self, canvas: &mut Canvas, row: &RowLayout) {
        let top = canvas.y;
        let mut x = MARGIN;
        for (col, lines) in self.columns.iter().zip(&row.cells) {
            canvas.push(DrawOp::Rect {
                x,
                y: top,
                width: col.width,
                height: row.height,
                fill: col.fill,
                stroke: Some(GRID_LINE),
            });
            self.draw_lines(
                canvas,
                lines,
                x,
                col.width,
                top,
                col.align,
                self.font_size,
                col.style,
                BODY_TEXT,
            );
            x += col.width;
        }
        canvas.y = top + row.height;
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_lines(
        &self,
        canvas: &mut Canvas,
        lines: &[String],
        x: f32,
        width: f32,
        top: f32,
        align: Align,
        size: f32,
        style: FontStyle,
        color: RgbColor,
    ) {
        // Baseline of the first line sits one cap height below the padding.
        let mut baseline = top + self.padding + size * PT_TO_MM * 0.8;
        for line in lines {
            let anchor = match align {
                Align::Left => x + self.padding,
                Align::Center => x + width / 2.0,
            };
            if !line.is_empty() {
                canvas.text(line, anchor, baseline, size, style, color, align);
            }
            baseline += line_height(size);
        }
    }

    /// Draw the table at the canvas cursor; the cursor ends at the table's
    /// bottom edge.
    pub fn draw(&self, canvas: &mut Canvas) {
        let header = self.layout_header();
        let rows: Vec<RowLayout> = self.rows.iter().map(|r| self.layout_row(r)).collect();

        // Keep the header together with the first row.
        let first = rows.first().map(|r| r.height).unwrap_or(0.0);
        if canvas.y + header.height + first > TABLE_BOTTOM {
            canvas.new_page();
        }
        self.draw_header(canvas, &header);

        for row in &rows {
            let at_page_top = canvas.y <= MARGIN + header.height + f32::EPSILON;
            if canvas.y + row.height > TABLE_BOTTOM && !at_page_top {
                debug!(y = canvas.y, row_height = row.height, "Table continues on new page");
                canvas.new_page();
                self.draw_header(canvas, &header);
            }
            self.draw_row(canvas, row);
        }
    }
}
