use atelier_contracts::catalog::StyleDescriptor;
use atelier_contracts::modes::Mode;

/// Instruction for the analysis call. Land planning folds the user's
/// description straight into the instruction.
pub fn analysis_instruction(mode: Mode, free_text: &str) -> String {
    match mode {
        Mode::SketchToRender => "Bạn là một kiến trúc sư cao cấp. Hãy phân tích hình ảnh phác thảo này. Xác nhận các đặc điểm hình khối, đường nét và đề xuất hướng phát triển 3D. Trả về JSON.".to_string(),
        Mode::PerspectiveToFloorplan => "Bạn là một chuyên gia quy hoạch mặt bằng. Phân tích phối cảnh này để suy luận bố cục không gian bên trong (vị trí cửa, giao thông, các phòng). Trả về JSON.".to_string(),
        Mode::LandToFloorplan => format!(
            "Bạn là chuyên gia quy hoạch kiến trúc. Phân tích mảnh đất dựa trên hình ảnh phác thảo (nếu có) và mô tả: {free_text}. Xác định kích thước, hướng tiếp cận và giải pháp phân khu. Trả về JSON."
        ),
        Mode::HomeRenovation => "Bạn là một chuyên gia cải tạo (Renovation Expert). Phân tích hiện trạng công trình này: đánh giá tình trạng vật liệu, cấu trúc chính và đề xuất cải tạo. Trả về JSON.".to_string(),
    }
}

/// High-priority override clause appended to generation instructions.
pub fn requirement_clause(requirement: Option<&str>) -> Option<String> {
    requirement
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| format!("YÊU CẦU CHI TIẾT TỪ NGƯỜI DÙNG (ƯU TIÊN CAO NHẤT): {value}"))
}

/// Instruction for one variant of the batch.
pub fn variant_instruction(
    mode: Mode,
    style: &StyleDescriptor,
    requirement: Option<&str>,
    has_image: bool,
) -> String {
    let name = style.name.as_str();
    let prompt = style.prompt_template.trim();
    let mut lines: Vec<String> = match mode {
        Mode::SketchToRender => vec![
            "Bạn là một chuyên gia diễn họa kiến trúc. Dựa trên phác thảo này, HOÀN THIỆN phối cảnh 3D.".to_string(),
            format!(
                "GIỮ NGUYÊN 100% hình khối gốc. Hoàn thiện vật liệu, cửa, cây cối, ánh sáng theo phong cách {name}: {prompt}."
            ),
        ],
        Mode::PerspectiveToFloorplan => vec![
            format!("Vẽ bản vẽ mặt bằng 2D chuyên nghiệp từ phối cảnh này. Kiểu {name}: {prompt}."),
            "Ký hiệu tường đậm, cửa nét mở, nội thất đầy đủ.".to_string(),
        ],
        Mode::LandToFloorplan => {
            let basis = if has_image {
                "Dựa trên phác thảo mảnh đất này và mô tả"
            } else {
                "Dựa trên mô tả chi tiết của khách hàng"
            };
            vec![
                format!("Bạn là chuyên gia thiết kế mặt bằng kiến trúc. {basis}, hãy thiết kế một mặt bằng 2D chuyên nghiệp (Top-down view)."),
                format!("Phong cách quy hoạch: {name} - {prompt}."),
                "Yêu cầu: Vẽ sơ đồ mặt bằng chi tiết, ký hiệu tường đậm, phân chia phòng khách, bếp, ngủ, vệ sinh hợp lý, có chú thích kích thước và ký hiệu cửa.".to_string(),
            ]
        }
        Mode::HomeRenovation => vec![
            "Bạn là chuyên gia CẢI TẠO KIẾN TRÚC. Nhiệm vụ: Biến đổi diện mạo của công trình trong ảnh này.".to_string(),
            "QUY TẮC BẮT BUỘC: Giữ nguyên hệ khung kết cấu chính.".to_string(),
            format!(
                "THỰC HIỆN: Thay đổi hoàn toàn vật liệu, hệ cửa, màu sơn và cảnh quan theo phong cách {name}: {prompt}."
            ),
        ],
    };

    if let Some(clause) = requirement_clause(requirement) {
        lines.push(clause);
    }
    lines.push(
        match mode {
            Mode::SketchToRender => "Ảnh 4K siêu thực.",
            Mode::PerspectiveToFloorplan => "Bản vẽ kỹ thuật sạch sẽ.",
            Mode::LandToFloorplan => "Bản vẽ phải đạt chuẩn kỹ thuật kiến trúc, trình bày trên nền trắng hoặc blueprint chuyên nghiệp.",
            Mode::HomeRenovation => "Kết quả phải là một công trình cũ đã được thay áo mới tinh tế.",
        }
        .to_string(),
    );
    lines.join("\n")
}
