use indexmap::IndexMap;

use super::registry::StyleDescriptor;
use crate::modes::Mode;

pub(super) fn default_catalog() -> IndexMap<Mode, Vec<StyleDescriptor>> {
    let mut map: IndexMap<Mode, Vec<StyleDescriptor>> = IndexMap::new();

    let mut insert = |mode: Mode, id: &str, name: &str, prompt: &str, description: &str| {
        map.entry(mode).or_default().push(StyleDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            prompt_template: prompt.to_string(),
            description: description.to_string(),
        });
    };

    insert(
        Mode::SketchToRender,
        "modern",
        "Modern Minimalism",
        "Architectural masterpiece, modern minimalism, raw concrete and floor-to-ceiling glass, floating volumes, seamless indoor-outdoor transition, cantilevered roofs, soft indirect lighting, high-end architectural photography, cinematic mood.",
        "Sự giao thoa giữa những khối hình kỷ hà và vật liệu thô mộc, tối ưu hóa ánh sáng tự nhiên.",
    );
    insert(
        Mode::SketchToRender,
        "tropical",
        "Biophilic Tropical",
        "Luxury tropical architecture, organic materials, integration with dense lush vegetation, wooden louvers, natural slate stone, water features reflecting the structure, warm ambient light, high-end resort aesthetic.",
        "Kiến trúc xanh bền vững, kết nối con người với thiên nhiên thông qua vật liệu hữu cơ.",
    );
    insert(
        Mode::SketchToRender,
        "industrial",
        "Refined Industrial",
        "Sophisticated industrial loft architecture, darkened steel, reclaimed brick, double-height ceilings, architectural structural honesty, monochromatic palette with metallic accents, mood lighting.",
        "Vẻ đẹp của sự chân thực trong cấu trúc, kết hợp giữa kim loại lạnh và ánh sáng ấm áp.",
    );
    insert(
        Mode::SketchToRender,
        "neoclassical",
        "Contemporary Classic",
        "Modern neoclassical interpretation, refined symmetry, clean classical orders, subtle ornamentation, light travertine stone, majestic yet restrained, timeless elegance, soft diffuse daylight.",
        "Sự kế thừa các giá trị vĩnh cửu của cổ điển trong một hình hài đương đại, tiết chế và sang trọng.",
    );

    insert(
        Mode::PerspectiveToFloorplan,
        "v1",
        "Open Flow",
        "Open-plan layout, merged living, dining and kitchen zones, minimal partition walls, continuous circulation.",
        "Giải phóng không gian, tạo sự kết nối liền mạch giữa các khu vực chức năng.",
    );
    insert(
        Mode::PerspectiveToFloorplan,
        "v2",
        "Privacy Core",
        "Clear separation of public and private wings, bedrooms off a dedicated corridor, buffered circulation axes.",
        "Tối ưu hóa các trục giao thông để đảm bảo sự riêng tư tuyệt đối cho từng thành viên.",
    );
    insert(
        Mode::PerspectiveToFloorplan,
        "v3",
        "Zen Atrium",
        "Rooms arranged around a central planted courtyard, skylit atrium core, daylight reaching every room.",
        "Thiết kế xoay quanh lõi xanh trung tâm, đưa sinh khí vào mọi ngóc ngách của ngôi nhà.",
    );
    insert(
        Mode::PerspectiveToFloorplan,
        "v4",
        "Flexible Module",
        "Modular grid layout, movable partitions, multi-purpose rooms that can be merged or split over time.",
        "Cấu trúc không gian tùy biến, sẵn sàng cho những thay đổi trong nhu cầu sử dụng dài hạn.",
    );

    insert(
        Mode::LandToFloorplan,
        "land-family",
        "Family Residence",
        "Architectural floor plan for a multi-generational family home, efficient room distribution, clear zoning for public and private areas, technical architectural symbols, high-contrast 2D top-down view.",
        "Bố cục mặt bằng tối ưu cho gia đình nhiều thế hệ, phân khu chức năng rõ rệt.",
    );
    insert(
        Mode::LandToFloorplan,
        "land-studio",
        "Compact Studio",
        "Smart living floor plan, open studio layout, multi-functional furniture zones, space-saving architectural solutions, 2D blueprint style, professional architectural drafting.",
        "Giải pháp không gian thông minh cho căn hộ nhỏ, tối đa hóa diện tích sử dụng.",
    );
    insert(
        Mode::LandToFloorplan,
        "land-villa",
        "Luxury Villa Layout",
        "Grand luxury villa floor plan, symmetrical or organic flow, large entertainment areas, swimming pool and landscape integration, detailed interior layout markers, 2D architectural masterplan.",
        "Quy hoạch mặt bằng biệt thự cao cấp với các không gian giải trí và sân vườn tích hợp.",
    );
    insert(
        Mode::LandToFloorplan,
        "land-commercial",
        "Boutique Office/Shop",
        "Commercial architectural floor plan, customer flow optimization, open workspace, service core placement, technical floor markers, professional 2D presentation.",
        "Thiết kế mặt bằng kinh doanh/văn phòng, tối ưu hóa luồng giao thông khách hàng.",
    );

    insert(
        Mode::HomeRenovation,
        "renov-modern",
        "Modern Refresh",
        "Full exterior renovation, preserving existing structure, replacing old windows with large black aluminum frames, clean white stucco walls, adding wooden slats accents, modern landscaping, architectural night lighting.",
        "Hiện đại hóa diện mạo bằng vật liệu đương đại, giữ nguyên hệ khung kết cấu cũ.",
    );
    insert(
        Mode::HomeRenovation,
        "renov-luxury",
        "Luxury Facelift",
        "High-end architectural transformation, preserving core volume, applying marble and stone cladding, sophisticated exterior lighting design, premium glass systems, luxury landscape design, photorealistic.",
        "Nâng cấp sang trọng với vật liệu đá tự nhiên và hệ thống chiếu sáng nghệ thuật.",
    );
    insert(
        Mode::HomeRenovation,
        "renov-biophilic",
        "Nature Integration",
        "Biophilic renovation, adding vertical gardens to existing walls, wooden trellises, natural earth tones, large openings for ventilation, organic integration with surroundings.",
        "Tái cấu trúc thẩm mỹ theo hướng bền vững, đưa thiên nhiên len lỏi vào công trình.",
    );
    insert(
        Mode::HomeRenovation,
        "renov-minimal",
        "Zen Transformation",
        "Minimalist renovation, stripping away unnecessary ornaments, focusing on pure geometry, muted color palette, high-quality finishes, serene atmosphere, master architect style.",
        "Loại bỏ các chi tiết rườm rà, tập trung vào vẻ đẹp của sự giản đơn và tinh tế.",
    );

    map
}
