use tagnav_image::{FrameBuffer, ImageError, ImageSize};

#[test]
fn write_mismatch_keeps_previous_contents() -> Result<(), ImageError> {
    let size = ImageSize {
        width: 4,
        height: 3,
    };
    let mut buffer = FrameBuffer::acquire(size)?;

    let frame: Vec<u8> = (0..12).collect();
    buffer.write(&frame)?;

    for len in [0, 11, 13, 24] {
        let res = buffer.write(&vec![255u8; len]);
        assert_eq!(
            res,
            Err(ImageError::SizeMismatch {
                expected: 12,
                actual: len
            })
        );
        assert_eq!(buffer.as_slice()?, frame.as_slice());
    }

    Ok(())
}

#[test]
fn write_mismatch_on_padded_buffer_uses_stride() -> Result<(), ImageError> {
    let mut buffer = FrameBuffer::acquire_aligned([10, 2].into(), 16)?;

    // a tightly packed frame is not a full padded frame
    assert_eq!(
        buffer.write(&[1u8; 20]),
        Err(ImageError::SizeMismatch {
            expected: 32,
            actual: 20
        })
    );
    buffer.write_packed(&[1u8; 20])?;

    let view = buffer.view()?;
    assert_eq!(view.stride, 16);
    assert_eq!(view.get(9, 1), Some(1));
    assert_eq!(view.data[10], 0);
    Ok(())
}

#[test]
fn double_release_is_a_noop() -> Result<(), ImageError> {
    let mut buffer = FrameBuffer::acquire([16, 16].into())?;
    buffer.release();
    buffer.release();
    assert!(buffer.is_released());
    Ok(())
}

#[test]
fn buffer_moves_across_threads() -> Result<(), Box<dyn std::error::Error>> {
    let mut buffer = FrameBuffer::acquire([8, 8].into())?;
    let handle = std::thread::spawn(move || -> Result<FrameBuffer, ImageError> {
        buffer.write(&[42u8; 64])?;
        Ok(buffer)
    });
    let buffer = handle.join().map_err(|_| "writer thread panicked")??;
    assert!(buffer.as_slice()?.iter().all(|&v| v == 42));
    Ok(())
}
