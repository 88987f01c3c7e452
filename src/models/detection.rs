//! 检测记录模型
//!
//! 外部检测器 / 识别器输出的标准化表示：一页上一个带标签的区域。

use serde::{Deserialize, Serialize};

/// 检测标签
///
/// 同时接受规范的 snake_case 名称和检测模型原始的类别名（如 `Mat_num`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// 学号
    #[serde(alias = "Mat_num", alias = "mat_num")]
    MatriculationNumber,
    /// 座位号
    #[serde(alias = "seat_num", alias = "Seat_num")]
    SeatNumber,
    /// 页码标记（"Seite X von Y"）
    #[serde(alias = "page_num")]
    PageNumber,
    /// 题目标题（"1.Frage ... (10 Punkte)"）
    #[serde(alias = "question_num")]
    QuestionHeader,
    /// 得分
    #[serde(alias = "grades")]
    Grade,
    /// 其他未知标签，处理时忽略
    #[serde(other)]
    Other,
}

/// 识别候选（文本 + 置信度）
///
/// 反序列化时既可以写成对象，也可以写成 `["12", 0.93]` 这样的二元数组。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub confidence: f64,
}

impl Candidate {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// 页面像素坐标系下的边框 (x1, y1, x2, y2)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 上边缘
    pub fn top(&self) -> f64 {
        self.y1
    }

    /// 垂直中心
    pub fn center_y(&self) -> f64 {
        (self.y1 + self.y2) / 2.0
    }
}

/// 一条检测记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub label: Label,
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub bbox: BBox,
    /// 页码（从 1 开始），加载文档时由所属页面统一填写
    #[serde(default)]
    pub page: u32,
    /// 裁剪图引用，只用于报告嵌入
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
}

impl DetectionRecord {
    pub fn new(label: Label, candidates: Vec<Candidate>, bbox: BBox, page: u32) -> Self {
        Self {
            label,
            candidates,
            bbox,
            page,
            crop: None,
        }
    }

    /// 置信度最高的候选，置信度相同时取先出现的
    pub fn best_candidate(&self) -> Option<&Candidate> {
        let mut best: Option<&Candidate> = None;
        for candidate in &self.candidates {
            let better = match best {
                Some(b) => candidate.confidence > b.confidence,
                None => !candidate.confidence.is_nan(),
            };
            if better {
                best = Some(candidate);
            }
        }
        best.or_else(|| self.candidates.first())
    }

    /// 置信度最高的候选文本
    pub fn best_text(&self) -> Option<&str> {
        self.best_candidate().map(|c| c.text.as_str())
    }

    /// 置信度最高的候选是否带有非空文本
    pub fn has_text(&self) -> bool {
        self.best_text().is_some_and(|text| !text.trim().is_empty())
    }
}

/// 单页检测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDetections {
    /// 文档内页码（从 1 开始）
    pub page: u32,
    #[serde(default)]
    pub records: Vec<DetectionRecord>,
}

impl PageDetections {
    /// 创建页面，并把页码写入每条记录
    pub fn new(page: u32, records: Vec<DetectionRecord>) -> Self {
        let mut detections = Self { page, records };
        detections.assign_page();
        detections
    }

    /// 把页面页码同步到每条记录
    pub fn assign_page(&mut self) {
        for record in &mut self.records {
            record.page = self.page;
        }
    }

    /// 本页是否开启一个新的学生分组
    pub fn has_matriculation_number(&self) -> bool {
        self.records
            .iter()
            .any(|r| r.label == Label::MatriculationNumber && r.has_text())
    }
}

/// 一份扫描文档（多页、可能包含多个学生）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pages: Vec<PageDetections>,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

impl ScanDocument {
    pub fn new(name: impl Into<String>, pages: Vec<PageDetections>) -> Self {
        let mut document = Self {
            name: name.into(),
            pages,
            file_path: None,
        };
        document.assign_pages();
        document
    }

    /// 把页码同步到所有记录
    pub fn assign_pages(&mut self) {
        for page in &mut self.pages {
            page.assign_page();
        }
    }

    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }
}
