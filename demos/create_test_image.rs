use image::{GrayImage, Luma};

fn main() {
    let mut img = GrayImage::from_pixel(400, 300, Luma([255u8]));

    // A filled rectangle and a hollow frame
    for y in 0..300 {
        for x in 0..400 {
            let block = (40..160).contains(&x) && (60..240).contains(&y);
            let frame = (220..360).contains(&x)
                && (60..240).contains(&y)
                && !((236..344).contains(&x) && (76..224).contains(&y));
            if block || frame {
                img.put_pixel(x, y, Luma([0u8]));
            }
        }
    }

    img.save("test_drawing.png").unwrap();
    println!("Created test_drawing.png (400x300 line drawing)");
}
